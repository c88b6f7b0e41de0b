//! Reply keyboard builders
//!
//! All keyboards are built from the shared button labels so the markup
//! can never drift from what the classifier recognizes.

use teloxide::types::{KeyboardButton, KeyboardMarkup};

use crate::state::labels;

fn markup(rows: Vec<Vec<KeyboardButton>>) -> KeyboardMarkup {
    KeyboardMarkup::new(rows).resize_keyboard()
}

fn row(texts: &[&str]) -> Vec<KeyboardButton> {
    texts.iter().map(|t| KeyboardButton::new(t.to_string())).collect()
}

/// Language choices offered on first contact
pub const LANG_RUSSIAN: &str = "Русский";
pub const LANG_ENGLISH: &str = "English";

pub fn language_keyboard() -> KeyboardMarkup {
    markup(vec![row(&[LANG_RUSSIAN, LANG_ENGLISH])])
}

pub fn accept_keyboard() -> KeyboardMarkup {
    markup(vec![row(&[labels::ACCEPT])])
}

pub fn main_menu_keyboard() -> KeyboardMarkup {
    markup(vec![
        row(&[labels::START_GAME]),
        row(&[labels::RULES, labels::ABOUT]),
        row(&[labels::FAQ, labels::CHARITY]),
    ])
}

/// Level screen keyboard: one "N level" button per unlocked level the
/// user can jump to, then the forward/back controls.
pub fn level_keyboard(current_level: i32) -> KeyboardMarkup {
    let mut rows = Vec::new();
    let mut nav_row = Vec::new();
    for level in 1..=current_level {
        nav_row.push(KeyboardButton::new(format!("{} level", level)));
        if nav_row.len() == 3 {
            rows.push(std::mem::take(&mut nav_row));
        }
    }
    if !nav_row.is_empty() {
        rows.push(nav_row);
    }
    rows.push(row(&[labels::NEXT_LEVEL, labels::LEVEL_RULES]));
    rows.push(row(&[labels::BACK]));
    markup(rows)
}

pub fn task_selection_keyboard() -> KeyboardMarkup {
    markup(vec![
        row(&[labels::TIME_TASK]),
        row(&[labels::INVITE_FRIEND]),
        row(&[labels::DONATE]),
        row(&[labels::BACK]),
    ])
}

pub fn time_task_keyboard() -> KeyboardMarkup {
    markup(vec![
        row(&[labels::START_TASK, labels::TASK_DONE]),
        row(&[labels::BACK]),
    ])
}

pub fn referral_task_keyboard() -> KeyboardMarkup {
    markup(vec![row(&[labels::CHECK_STATUS]), row(&[labels::BACK])])
}

pub fn donation_task_keyboard() -> KeyboardMarkup {
    markup(vec![row(&[labels::CHECK_STATUS]), row(&[labels::BACK])])
}

pub fn charity_keyboard() -> KeyboardMarkup {
    markup(vec![row(&[labels::CHARITY_STATUS]), row(&[labels::BACK])])
}

pub fn final_level_keyboard() -> KeyboardMarkup {
    markup(vec![
        row(&[labels::COMMUNITY_LINK]),
        row(&[labels::CHARITY]),
        row(&[labels::BACK]),
    ])
}

pub fn faq_keyboard() -> KeyboardMarkup {
    markup(vec![row(&[labels::BACK])])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_keyboard_row_width() {
        let kb = level_keyboard(7);
        // 7 jump buttons in rows of 3, plus two control rows
        assert_eq!(kb.keyboard.len(), 3 + 2);
        assert_eq!(kb.keyboard[0].len(), 3);
        assert_eq!(kb.keyboard[2].len(), 1);
    }

    #[test]
    fn test_level_one_has_single_jump_button() {
        let kb = level_keyboard(1);
        assert_eq!(kb.keyboard.len(), 1 + 2);
        assert_eq!(kb.keyboard[0][0].text, "1 level");
    }
}
