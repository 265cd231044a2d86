//! Edit operations on a menu tree.
//!
//! Every operation takes the current tree by reference and returns the next one;
//! the input is never modified. Sections are found by id, items and prices by
//! position. A failed precondition returns an [`EditError`] and produces no tree.

use std::fmt;
use std::str::FromStr;

use crate::error::EditError;
use crate::model::{MenuItem, MenuSection, MenuTree};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Popular,
    Spicy,
}

impl Tag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tag::Popular => "isPopular",
            Tag::Spicy => "isSpicy",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "popular" | "isPopular" => Ok(Tag::Popular),
            "spicy" | "isSpicy" => Ok(Tag::Spicy),
            other => Err(format!("unknown tag: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            other => Err(format!("unknown direction: {other}")),
        }
    }
}

fn edit_section<F>(tree: &MenuTree, section_id: &str, f: F) -> Result<MenuTree, EditError>
where
    F: FnOnce(&mut MenuSection) -> Result<(), EditError>,
{
    let index = tree
        .position(section_id)
        .ok_or_else(|| EditError::UnknownSection(section_id.to_string()))?;
    let mut next = tree.clone();
    f(next.section_mut(index))?;
    Ok(next)
}

fn item_mut(section: &mut MenuSection, index: usize) -> Result<&mut MenuItem, EditError> {
    let len = section.items.len();
    let id = &section.id;
    if index >= len {
        return Err(EditError::ItemOutOfRange {
            section: id.clone(),
            index,
            len,
        });
    }
    Ok(&mut section.items[index])
}

pub fn update_price(
    tree: &MenuTree,
    section_id: &str,
    item_index: usize,
    price_index: usize,
    value: impl Into<String>,
) -> Result<MenuTree, EditError> {
    let value = value.into();
    edit_section(tree, section_id, |section| {
        let section_name = section.id.clone();
        let item = item_mut(section, item_index)?;
        let len = item.prices.len();
        let slot = item
            .prices
            .get_mut(price_index)
            .ok_or(EditError::PriceOutOfRange {
                section: section_name,
                item: item_index,
                index: price_index,
                len,
            })?;
        *slot = value;
        Ok(())
    })
}

pub fn toggle_tag(
    tree: &MenuTree,
    section_id: &str,
    item_index: usize,
    tag: Tag,
) -> Result<MenuTree, EditError> {
    edit_section(tree, section_id, |section| {
        let item = item_mut(section, item_index)?;
        let flag = match tag {
            Tag::Popular => &mut item.is_popular,
            Tag::Spicy => &mut item.is_spicy,
        };
        *flag = Some(!flag.unwrap_or(false));
        Ok(())
    })
}

/// Removes an item and shifts the rest left. Callers confirm with the user first;
/// there is no undo.
pub fn delete_item(
    tree: &MenuTree,
    section_id: &str,
    item_index: usize,
) -> Result<MenuTree, EditError> {
    edit_section(tree, section_id, |section| {
        item_mut(section, item_index)?;
        section.items.remove(item_index);
        Ok(())
    })
}

/// Swaps an item with its neighbour. Moving the first item up or the last item
/// down returns the tree unchanged.
pub fn reorder_item(
    tree: &MenuTree,
    section_id: &str,
    item_index: usize,
    direction: Direction,
) -> Result<MenuTree, EditError> {
    let section = tree
        .section(section_id)
        .ok_or_else(|| EditError::UnknownSection(section_id.to_string()))?;
    let len = section.items.len();
    if item_index >= len {
        return Err(EditError::ItemOutOfRange {
            section: section_id.to_string(),
            index: item_index,
            len,
        });
    }
    let neighbour = match direction {
        Direction::Up if item_index > 0 => item_index - 1,
        Direction::Down if item_index + 1 < len => item_index + 1,
        _ => return Ok(tree.clone()),
    };
    edit_section(tree, section_id, |section| {
        section.items.swap(item_index, neighbour);
        Ok(())
    })
}
