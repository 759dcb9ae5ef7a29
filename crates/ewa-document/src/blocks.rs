//! Block splitter: partitions a section body into text runs and pipe tables.
//!
//! A table starts on a line containing `|` whose next line contains both `|`
//! and `---`. The one-line lookahead also fires on prose that happens to
//! match, which the dialect accepts.
use crate::model::Block;

pub fn split_blocks<S: AsRef<str>>(lines: &[S]) -> Vec<Block> {
    let mut blocks: Vec<Block> = Vec::new();
    let mut text: Vec<String> = Vec::new();
    let mut table: Option<Vec<String>> = None;

    let mut i = 0;
    while i < lines.len() {
        let line = lines[i].as_ref();

        if let Some(rows) = table.as_mut() {
            if line.contains('|') {
                rows.push(line.to_string());
                i += 1;
                continue;
            }
            if let Some(rows) = table.take() {
                push_block(&mut blocks, Block::Table { lines: rows });
            }
        } else if is_table_start(line, lines.get(i + 1).map(|l| l.as_ref())) {
            push_block(&mut blocks, Block::Text { lines: std::mem::take(&mut text) });
            table = Some(vec![line.to_string(), lines[i + 1].as_ref().to_string()]);
            i += 2;
            continue;
        }

        text.push(line.to_string());
        i += 1;
    }

    if let Some(rows) = table {
        push_block(&mut blocks, Block::Table { lines: rows });
    }
    push_block(&mut blocks, Block::Text { lines: text });

    blocks
}

fn is_table_start(line: &str, next: Option<&str>) -> bool {
    line.contains('|') && next.is_some_and(|n| n.contains('|') && n.contains("---"))
}

fn push_block(blocks: &mut Vec<Block>, block: Block) {
    let lines = match &block {
        Block::Text { lines } | Block::Table { lines } => lines,
    };
    if lines.iter().any(|l| !l.trim().is_empty()) {
        blocks.push(block);
    }
}
