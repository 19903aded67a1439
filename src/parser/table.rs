//! Pipe tables.
//!
//! A table opens when a paragraph's last line is followed by a delimiter
//! row with the same number of cells.  The table then stays the container
//! for every following non-blank line, each becoming one closed row.

use crate::nodes::{make_node, Node, NodeTableCell, NodeValue, TableAlignment};
use crate::parser::{newline_len, Parser};
use crate::strings;

pub(super) fn try_opening_block<'a>(
    parser: &mut Parser<'a, '_>,
    container: Node<'a>,
    line: &str,
) -> Option<Node<'a>> {
    let aligns = match container.data().value {
        NodeValue::Paragraph => None,
        NodeValue::Table(ref aligns) => Some(aligns.clone()),
        _ => return None,
    };

    match aligns {
        None => try_opening_header(parser, container, line),
        Some(ref aligns) => try_opening_row(parser, container, aligns, line),
    }
}

fn try_opening_header<'a>(
    parser: &mut Parser<'a, '_>,
    container: Node<'a>,
    line: &str,
) -> Option<Node<'a>> {
    let delimiter_line = strings::trim_str(&line[parser.first_nonspace..]);
    let marker_row = row(delimiter_line)?;
    let alignments = marker_row
        .iter()
        .map(|cell| alignment(cell))
        .collect::<Option<Vec<_>>>()?;

    let content = container.data().content.clone();
    let body = content.trim_end_matches(['\r', '\n']);
    let (preceding, header_line) = match body.rfind('\n') {
        Some(eol) => (&body[..=eol], &body[eol + 1..]),
        None => ("", body),
    };
    let header_line = strings::trim_str(header_line);
    let header_row = row(header_line)?;

    if header_row.len() != marker_row.len()
        || !(header_line.contains('|') || delimiter_line.contains('|'))
    {
        return None;
    }

    let parent = container.parent()?;
    let table = make_node(
        parser.arena,
        NodeValue::Table(alignments.clone()),
        parser.line_number.saturating_sub(1),
    );
    table.data_mut().nesting = parent.data().nesting + 1;

    container.insert_after(table);
    if strings::is_blank(preceding) {
        container.detach();
    } else {
        container.data_mut().content = preceding.to_string();
        parser.finalize(container);
    }

    append_row(parser, table, &alignments, header_row, true);

    let end = line.len() - newline_len(line) - parser.offset;
    parser.advance_offset(line, end, false);

    Some(table)
}

fn try_opening_row<'a>(
    parser: &mut Parser<'a, '_>,
    container: Node<'a>,
    alignments: &[TableAlignment],
    line: &str,
) -> Option<Node<'a>> {
    if parser.blank {
        return None;
    }

    let this_row = row(strings::trim_str(&line[parser.first_nonspace..])).unwrap_or_default();
    append_row(parser, container, alignments, this_row, false);

    let end = line.len() - newline_len(line) - parser.offset;
    parser.advance_offset(line, end, false);

    Some(container)
}

/// Append one closed row, truncating surplus cells and padding missing ones.
fn append_row<'a>(
    parser: &mut Parser<'a, '_>,
    table: Node<'a>,
    alignments: &[TableAlignment],
    cells: Vec<String>,
    header: bool,
) {
    let nesting = table.data().nesting;
    let new_row = make_node(parser.arena, NodeValue::TableRow(header), parser.line_number);
    new_row.data_mut().open = false;
    new_row.data_mut().nesting = nesting + 1;
    table.append(new_row);

    let mut cells = cells.into_iter();
    for &alignment in alignments {
        let cell = make_node(
            parser.arena,
            NodeValue::TableCell(NodeTableCell { alignment, header }),
            parser.line_number,
        );
        {
            let mut ast = cell.data_mut();
            ast.open = false;
            ast.nesting = nesting + 2;
            ast.content = cells.next().unwrap_or_default();
        }
        new_row.append(cell);
    }
}

fn alignment(cell: &str) -> Option<TableAlignment> {
    let left = cell.starts_with(':');
    let right = cell.len() > 1 && cell.ends_with(':');
    let dashes = cell.trim_start_matches(':').trim_end_matches(':');
    if dashes.is_empty() || !dashes.bytes().all(|b| b == b'-') {
        return None;
    }
    Some(match (left, right) {
        (true, true) => TableAlignment::Center,
        (true, false) => TableAlignment::Left,
        (false, true) => TableAlignment::Right,
        (false, false) => TableAlignment::None,
    })
}

/// Split a row on unescaped pipes.  A leading and a trailing pipe are
/// optional.  Escapes are left in place for the inline phase, so code spans
/// keep their backslashes.
fn row(line: &str) -> Option<Vec<String>> {
    if line.is_empty() {
        return None;
    }

    let bytes = line.as_bytes();
    let mut cells = vec![];
    let mut start = usize::from(bytes[0] == b'|');
    let mut i = start;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'|' => {
                cells.push(strings::trim_str(&line[start..i]).to_string());
                start = i + 1;
                i += 1;
            }
            _ => i += 1,
        }
    }

    if start < bytes.len() {
        cells.push(strings::trim_str(&line[start..]).to_string());
    }

    if cells.is_empty() {
        None
    } else {
        Some(cells)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_split_on_unescaped_pipes() {
        assert_eq!(row("| a | b |").unwrap(), vec!["a", "b"]);
        assert_eq!(row("a|b").unwrap(), vec!["a", "b"]);
        assert_eq!(row("`a \\| b` | c").unwrap(), vec!["`a \\| b`", "c"]);
        assert_eq!(row("| `x | y` |").unwrap(), vec!["`x", "y`"]);
        assert!(row("").is_none());
        assert!(row("|").is_none());
    }

    #[test]
    fn alignments() {
        assert_eq!(alignment(":-:"), Some(TableAlignment::Center));
        assert_eq!(alignment(":--"), Some(TableAlignment::Left));
        assert_eq!(alignment("--:"), Some(TableAlignment::Right));
        assert_eq!(alignment("---"), Some(TableAlignment::None));
        assert_eq!(alignment(":"), None);
        assert_eq!(alignment("-x-"), None);
    }
}
