//! Hyperlink construction.
//!
//! Link addresses are made relative to the directory of the annotated
//! document so the document and its exhibit folder can be moved together.

use super::Hyperlink;
use crate::config::LinkStyle;
use crate::extract::Identifier;
use crate::resolve::TargetDescriptor;
use std::path::{Component, Path, PathBuf};

/// `path` expressed relative to `base`, or `None` when the two share no root
/// (different drives, or one relative and one absolute).
pub fn relative_path(path: &Path, base: &Path) -> Option<PathBuf> {
    if path.is_absolute() != base.is_absolute() {
        return None;
    }

    let path: Vec<Component> = path.components().filter(|c| *c != Component::CurDir).collect();
    let base: Vec<Component> = base.components().filter(|c| *c != Component::CurDir).collect();

    let common = path.iter().zip(&base).take_while(|(a, b)| a == b).count();
    let shares_root = match (path.first(), base.first()) {
        (Some(Component::Prefix(a)), Some(Component::Prefix(b))) => a == b,
        (Some(Component::Prefix(_)), _) | (_, Some(Component::Prefix(_))) => false,
        _ => true,
    };
    if !shares_root {
        return None;
    }
    if base[common..].iter().any(|c| *c == Component::ParentDir) {
        return None;
    }

    let mut relative = PathBuf::new();
    for _ in common..base.len() {
        relative.push("..");
    }
    for component in &path[common..] {
        relative.push(component.as_os_str());
    }
    Some(relative)
}

/// Address written into the link.
///
/// Relative to `base` when one is given and reachable, otherwise the file
/// name alone; without a base the target path is used as is. Separators are
/// always `/`, and paged targets get a `#page=N` fragment.
pub fn link_address(target: &TargetDescriptor, base: Option<&Path>) -> String {
    let path = target.path();
    let mut address = match base {
        Some(base) => match relative_path(path, base) {
            Some(rel) => to_forward_slashes(&rel),
            None => {
                log::debug!(
                    "No relative path from {} to {}, using the file name",
                    base.display(),
                    path.display()
                );
                target.file_name()
            },
        },
        None => to_forward_slashes(path),
    };
    if let Some(page) = target.page() {
        address.push_str(&format!("#page={}", page));
    }
    address
}

fn to_forward_slashes(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Hover text for a link.
pub fn screen_tip(target: &TargetDescriptor, identifier: &Identifier) -> String {
    let mut tip = format!("Link to {}", target.file_name());
    if let Some(page) = target.page() {
        tip.push_str(&format!(" page {}", page));
    }
    if let Some(number) = identifier.bates_number() {
        tip.push_str(&format!(" (Bates {})", number));
    }
    tip
}

/// Assemble the hyperlink for one resolved citation.
pub fn build_hyperlink(
    target: TargetDescriptor,
    identifier: &Identifier,
    display_text: impl Into<String>,
    base: Option<&Path>,
    style: LinkStyle,
) -> Hyperlink {
    Hyperlink {
        address: link_address(&target, base),
        screen_tip: screen_tip(&target, identifier),
        display_text: display_text.into(),
        target,
        style,
    }
}
