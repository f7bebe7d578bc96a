//! Graphviz DOT形式での書き出し
use std::io::{BufWriter, Write};

use crate::errors::Result;
use crate::lattice::Lattice;

fn escape(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"")
}

impl Lattice {
    /// ラティスをGraphvizのDOT形式で書き出します。
    ///
    /// ノードは「単語/開始フレーム」、エッジは「単語/音響スコア（自然対数）」で
    /// ラベル付けされます。開始ノードと終了ノードは二重丸で描画されます。
    pub fn write_dot<W>(&self, wtr: W) -> Result<()>
    where
        W: Write,
    {
        let mut wtr = BufWriter::new(wtr);
        let lmath = self.logmath();

        writeln!(wtr, "digraph lattice {{")?;
        writeln!(wtr, "    rankdir=LR;")?;
        writeln!(wtr, "    node [shape=circle];")?;
        for (i, node) in self.nodes().iter().enumerate() {
            let word = self.word_str(node.lm_state()).unwrap_or(crate::slf::NULL_WORD);
            let label = escape(&format!("{word}/{}", node.sf()));
            if Some(i) == self.start_idx() || Some(i) == self.end_idx() {
                writeln!(wtr, "    n{i} [label=\"{label}\", shape=doublecircle];")?;
            } else {
                writeln!(wtr, "    n{i} [label=\"{label}\"];")?;
            }
        }
        for (link, (src, dest)) in self.links().iter().zip(self.link_endpoints()?) {
            let word = self.word_str(link.word()).unwrap_or(crate::slf::NULL_WORD);
            let label = escape(&format!("{word}/{:.2}", lmath.log_to_ln(link.ascr())));
            writeln!(wtr, "    n{src} -> n{dest} [label=\"{label}\"];")?;
        }
        writeln!(wtr, "}}")?;
        wtr.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(escape(r#"a"b\c"#), r#"a\"b\\c"#);
    }
}
