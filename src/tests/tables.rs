use super::*;

#[test]
fn table() {
    html(
        concat!("| a | b |\n", "|---|--:|\n", "| c | d |\n"),
        concat!(
            "<table>\n",
            "<thead>\n",
            "<tr>\n",
            "<th>a</th>\n",
            "<th align=\"right\">b</th>\n",
            "</tr>\n",
            "</thead>\n",
            "<tbody>\n",
            "<tr>\n",
            "<td>c</td>\n",
            "<td align=\"right\">d</td>\n",
            "</tr>\n",
            "</tbody>\n",
            "</table>\n"
        ),
    );
}

#[test]
fn header_only() {
    html(
        "a|b\n:-:|-\n",
        concat!(
            "<table>\n",
            "<thead>\n",
            "<tr>\n",
            "<th align=\"center\">a</th>\n",
            "<th>b</th>\n",
            "</tr>\n",
            "</thead>\n",
            "</table>\n"
        ),
    );
}

#[test]
fn inline_content_in_cells() {
    html(
        concat!("| x |\n", "|---|\n", "| *a* `b\\|c` |\n", "\n", "after\n"),
        concat!(
            "<table>\n",
            "<thead>\n",
            "<tr>\n",
            "<th>x</th>\n",
            "</tr>\n",
            "</thead>\n",
            "<tbody>\n",
            "<tr>\n",
            "<td><em>a</em> <code>b\\|c</code></td>\n",
            "</tr>\n",
            "</tbody>\n",
            "</table>\n",
            "<p>after</p>\n"
        ),
    );
}

#[test]
fn mismatched_delimiter_row() {
    html("| a | b |\n|---|\n", "<p>| a | b |\n|---|</p>\n");
}

#[test]
fn disabled() {
    html_opts!(
        [tokenizers.disabled = super::disabled(&["table"])],
        "| a |\n|---|\n",
        "<p>| a |\n|---|</p>\n"
    );
}
