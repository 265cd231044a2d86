//! Built-in menu used when neither the cache nor the remote has one.

use crate::model::{MenuItem, MenuSection, MenuTree};

pub fn builtin_menu() -> MenuTree {
    MenuTree::new(vec![
        MenuSection::new("feteer", "فطير مشلتت وحادق", "🥨")
            .with_image("/images/feteer.jpg")
            .with_subtitles(&["صغير", "كبير"])
            .with_items(vec![
                MenuItem::new("فطير مشلتت سادة", &["60", "90"]).popular(),
                MenuItem::new("فطير جبنة رومي", &["70", "100"]),
                MenuItem::new("فطير سجق", &["75", "110"]).spicy(),
                MenuItem::new("فطير لحمة مفرومة", &["85", "125"])
                    .with_description("لحمة بلدي مع فلفل ألوان"),
                MenuItem::new("فطير سوبر أطياب", &["120", "170"])
                    .with_description("سجق، بسطرمة، لحمة، جبنة موتزاريلا")
                    .popular(),
            ]),
        MenuSection::new("grills", "مشويات", "🔥")
            .with_image("/images/grills.jpg")
            .with_items(vec![
                MenuItem::new("كفتة", &["95", "180"]).with_labels(&["ربع", "نص"]),
                MenuItem::new("شيش طاووق", &["90", "170"]).with_labels(&["ربع", "نص"]),
                MenuItem::new("حواوشي", &["45"]),
                MenuItem::new("ريش ضاني", &["240"]).popular(),
            ]),
        MenuSection::new("sweets", "فطير حلو", "🍯")
            .with_image("/images/sweets.jpg")
            .with_subtitles(&["صغير", "كبير"])
            .with_items(vec![
                MenuItem::new("فطير بالسكر", &["45", "65"]),
                MenuItem::new("فطير نوتيلا", &["70", "100"]).popular(),
                MenuItem::new("فطير قشطة وعسل", &["65", "95"]),
            ]),
        MenuSection::new("drinks", "مشروبات", "🥤")
            .with_image("/images/drinks.jpg")
            .with_items(vec![
                MenuItem::new("شاي", &["10"]),
                MenuItem::new("قهوة تركي", &["20"]),
                MenuItem::new("عصير مانجو", &["35"]),
                MenuItem::new("مياه معدنية", &["10"]),
            ]),
    ])
}
