// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use crate::model::TaskList;

// A palette of 20 distinct colors for lists created without one.
// The first entry is the historical default list color.
pub const LIST_PALETTE: [&str; 20] = [
    "#2c5282", // Deep blue
    "#ff7f0e", // Orange
    "#2ca02c", // Green
    "#d62728", // Red
    "#9467bd", // Purple
    "#8c564b", // Brown
    "#e377c2", // Pink
    "#7f7f7f", // Grey
    "#bcbd22", // Olive
    "#17becf", // Cyan
    "#aec7e8", // Light blue
    "#ffbb78", // Light orange
    "#98df8a", // Light green
    "#ff9896", // Light red
    "#c5b0d5", // Light purple
    "#c49c94", // Light brown
    "#f7b6d2", // Light pink
    "#c7c7c7", // Light grey
    "#dbdb8d", // Light olive
    "#9edae5", // Light cyan
];

/// Picks the color for a new list.
///
/// The first palette color no existing list uses wins. Once every color is
/// taken the palette wraps around by list count.
pub fn next_list_color(existing: &[TaskList]) -> String {
    LIST_PALETTE
        .iter()
        .find(|color| {
            !existing
                .iter()
                .any(|list| list.color.eq_ignore_ascii_case(color))
        })
        .unwrap_or(&LIST_PALETTE[existing.len() % LIST_PALETTE.len()])
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(name: &str, color: &str) -> TaskList {
        TaskList {
            id: name.to_string(),
            name: name.to_string(),
            color: color.to_string(),
        }
    }

    #[test]
    fn test_first_list_gets_default_color() {
        assert_eq!(next_list_color(&[]), "#2c5282");
    }

    #[test]
    fn test_skips_colors_in_use() {
        let lists = vec![list("Work", "#2C5282"), list("Home", "#2ca02c")];

        // Case-insensitive comparison, then the first free slot.
        assert_eq!(next_list_color(&lists), "#ff7f0e");
    }

    #[test]
    fn test_palette_wraps_around() {
        let mut lists: Vec<TaskList> = LIST_PALETTE
            .iter()
            .enumerate()
            .map(|(i, color)| list(&format!("List {i}"), color))
            .collect();

        // Every color is taken: 20 lists wrap to index 0.
        assert_eq!(next_list_color(&lists), LIST_PALETTE[0]);

        lists.push(list("Extra", LIST_PALETTE[0]));
        assert_eq!(next_list_color(&lists), LIST_PALETTE[1]);
    }
}
