//! Configuration management

use config::{Config, ConfigError, Environment, File};
use menu_proto::RecordKey;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use validator::Validate;

use crate::admin::AdminCredential;
use crate::cache::FsSlots;
use crate::defaults::builtin_menu;
use crate::error::AppError;
use crate::model::MenuTree;

pub const DEFAULT_RECORD_KEY: &str = "atyab_menu_data_v11";
pub const DEFAULT_SOCKET_PATH: &str = "/run/menusync.sock";

const MAPS_LINK: &str = "https://www.google.com/maps/place/%D9%85%D8%B7%D8%B9%D9%85+%D9%81%D8%B7%D8%A7%D8%B7%D8%B1%D9%89+%D8%A7%D8%B7%D9%8A%D8%A7%D8%A8+%D8%A7%D9%84%D8%A8%D8%AF%D8%B1%D8%B4%D9%8A%D9%86%E2%80%AD/@29.8487742,31.2735716,17z/data=!3m1!4b1!4m6!3m5!1s0x145835000e5c3471:0xff8afd050dcf7b04!8m2!3d29.8487742!4d31.2709967!16s%2Fg%2F11yx79gyjb?entry=ttu&g_ep=EgoyMDI2MDExMy4wIKXMDSoKLDEwMDc5MjA2OUgBUAM%3D";

#[derive(Debug, Deserialize, Clone, Validate)]
pub struct MenuConfig {
    #[serde(default)]
    #[validate(nested)]
    pub brand: BrandSettings,
    #[serde(default)]
    pub admin: AdminSettings,
    pub sync: SyncSettings,
    pub cache: CacheSettings,
    /// JSON document replacing the built-in default menu.
    #[serde(default)]
    pub default_menu: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone, Validate)]
#[serde(default)]
pub struct BrandSettings {
    #[validate(length(min = 1))]
    pub name: String,
    pub subtitle: String,
    pub location: String,
    pub whatsapp: String,
    pub phones: Vec<PhoneContact>,
    #[validate(url)]
    pub maps_link: String,
    pub designer: String,
    pub designer_phone: String,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct PhoneContact {
    pub number: String,
    pub label: String,
}

impl Default for BrandSettings {
    fn default() -> Self {
        Self {
            name: "ATYAB".into(),
            subtitle: "فطاطري أطياب".into(),
            location: "📍 البدرشين - برج أنس الوجود".into(),
            whatsapp: "201124005181".into(),
            phones: vec![
                PhoneContact {
                    number: "01124005181".into(),
                    label: "رقم 1".into(),
                },
                PhoneContact {
                    number: "01044168230".into(),
                    label: "رقم 2".into(),
                },
            ],
            maps_link: MAPS_LINK.into(),
            designer: "مهندس / احمد النقيب".into(),
            designer_phone: "01092621367".into(),
        }
    }
}

impl BrandSettings {
    pub fn whatsapp_link(&self) -> String {
        format!("https://wa.me/{}", self.whatsapp)
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AdminSettings {
    /// Plain text or an Argon2 PHC string. Unset disables admin mode.
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SyncSettings {
    pub socket_path: PathBuf,
    pub record_key: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheSettings {
    pub dir: PathBuf,
}

impl MenuConfig {
    /// `.env`, then `config/default`, `config/{APP_ENV}`, then `MENU__*` variables.
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::load_from(Path::new("config"))
    }

    pub fn load_from(dir: &Path) -> Result<Self, AppError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        let config = Self::builder(dir, &env)?
            .add_source(
                Environment::with_prefix("MENU")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        let cfg: MenuConfig = config.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn builder(
        dir: &Path,
        env: &str,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        let default_cache = std::env::temp_dir().join("menu-cache");
        Ok(Config::builder()
            .set_default("sync.socket_path", DEFAULT_SOCKET_PATH)?
            .set_default("sync.record_key", DEFAULT_RECORD_KEY)?
            .set_default("cache.dir", default_cache.to_string_lossy().to_string())?
            .add_source(File::with_name(&dir.join("default").to_string_lossy()).required(false))
            .add_source(File::with_name(&dir.join(env).to_string_lossy()).required(false)))
    }

    pub fn record_key(&self) -> Result<RecordKey, AppError> {
        Ok(RecordKey::parse(&self.sync.record_key)?)
    }

    pub fn credential(&self) -> AdminCredential {
        AdminCredential::from_setting(self.admin.password.as_deref())
    }

    pub fn cache_slots(&self) -> FsSlots {
        FsSlots::new(&self.cache.dir)
    }

    /// The configured default document, or the built-in one.
    pub fn default_tree(&self) -> Result<MenuTree, AppError> {
        match &self.default_menu {
            Some(path) => {
                let bytes = fs::read(path)?;
                Ok(MenuTree::from_json_slice(&bytes)?)
            }
            None => Ok(builtin_menu()),
        }
    }
}
