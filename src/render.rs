use alloc::string::String;

use core::fmt;

use crate::tree::{Color, NIL, SymbolTable, WalkStats};

impl SymbolTable {
    /// Renders the tree level by level into a fixed-width text picture.
    ///
    /// Each line holds one depth, with nodes printed as a two-column
    /// right-justified key followed by `r` or `b` for the color, positioned
    /// so children sit under their parent. Levels too deep to fit the 120
    /// column budget are elided. Debugging aid only; an empty table renders
    /// as the empty string.
    pub fn dump(&self) -> String {
        if self.root == NIL {
            return String::new();
        }
        let mut stats = WalkStats::default();
        self.walk(self.root, 0, &mut stats);
        let mut lines = vec![String::new(); stats.max_depth];
        self.stringify(self.root, 0, 1, &mut lines);
        lines.join("\n\n")
    }

    fn stringify(&self, node: usize, depth: usize, offset: usize, lines: &mut [String]) {
        if node == NIL {
            return;
        }
        // Column budget per node at this depth, rounded to nearest. Once a
        // segment drops under four columns nothing legible fits, so the
        // whole subtree is skipped.
        let denom = (1_usize << depth) + 1;
        let segment = (240 + denom) / (2 * denom);
        if segment < 4 {
            return;
        }

        let location = segment * offset;
        let line = &mut lines[depth];
        let used = line.chars().count();
        for _ in used..location {
            line.push(' ');
        }
        let entry = &self.nodes[node];
        let tag = match entry.color {
            Color::Red => 'r',
            Color::Black => 'b',
        };
        line.push_str(&format!("{:>2}{tag}", entry.key));

        self.stringify(entry.left, depth + 1, offset * 2 - 1, lines);
        self.stringify(entry.right, depth + 1, offset * 2, lines);
    }
}

impl fmt::Display for SymbolTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dump())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    #[test]
    fn empty_table_renders_empty() {
        assert_eq!(SymbolTable::new().dump(), "");
    }

    #[test]
    fn three_nodes_land_on_their_columns() {
        let mut table = SymbolTable::new();
        table.put("b", "v").put("a", "v").put("c", "v");

        let picture = table.dump();
        let levels: Vec<&str> = picture.split("\n\n").collect();
        assert_eq!(levels.len(), 2);

        // Root at the 60 column mark, children at 40 and 80; the key is
        // right-justified in two columns, so the letter lands one past.
        assert_eq!(levels[0].trim(), "bb");
        assert_eq!(levels[0].find("bb"), Some(61));
        assert_eq!(levels[1].find("ar"), Some(41));
        assert_eq!(levels[1].find("cr"), Some(81));
    }

    #[test]
    fn display_matches_dump() {
        let mut table = SymbolTable::new();
        table.put("m", "v").put("d", "v").put("t", "v");
        assert_eq!(format!("{table}"), table.dump());
    }

    #[test]
    fn deep_levels_are_elided() {
        let mut table = SymbolTable::new();
        for i in 0..100 {
            table.put(&format!("{i:03}"), "v");
        }
        assert!(table.height() > 6);
        for (depth, level) in table.dump().split("\n\n").enumerate() {
            if depth >= 6 {
                assert!(level.is_empty(), "depth {depth} should be elided");
            } else {
                assert!(!level.is_empty(), "depth {depth} should be rendered");
            }
        }
    }
}
