//! UTF-8 plain-text export of translations.

use super::{generated_line, EXPORT_TITLE};
use crate::output::TranslationMap;
use chrono::{DateTime, Local};
use std::fmt::Write;

fn rule() -> String {
    "=".repeat(60)
}

/// Render every translated page, grouped by file, each page under a
/// `--- Page N ---` marker.
pub fn translations_txt(translations: &TranslationMap, generated: DateTime<Local>) -> String {
    let rule = rule();
    let mut out = String::new();

    // Writing into a String cannot fail.
    let _ = write!(
        out,
        "{EXPORT_TITLE}\n{}\n\n{rule}\nTranslated PDF Content\n{rule}\n\n",
        generated_line(generated)
    );

    for (file, pages) in translations {
        let _ = write!(out, "\n{rule}\nFile: {file}\n{rule}\n\n");
        for page in pages {
            let _ = write!(out, "\n--- Page {} ---\n\n{}\n\n", page.page_num, page.text());
        }
    }
    out
}
