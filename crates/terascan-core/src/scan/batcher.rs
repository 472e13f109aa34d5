/// Pack links into newline-separated chunks of at most `max_chars` characters.
///
/// Order is preserved. A link longer than `max_chars` gets a chunk of its own.
///
/// # Examples
///
/// ```
/// use terascan_core::scan::chunk_links;
///
/// let chunks = chunk_links(&["aaaa", "bbbb", "cc"], 9);
/// assert_eq!(chunks, vec!["aaaa\nbbbb", "cc"]);
/// ```
#[must_use]
pub fn chunk_links<S: AsRef<str>>(links: &[S], max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for link in links {
        let link = link.as_ref();
        let link_len = link.chars().count();

        if current.is_empty() {
            current.push_str(link);
            current_len = link_len;
            continue;
        }

        if current_len + 1 + link_len > max_chars {
            chunks.push(std::mem::take(&mut current));
            current.push_str(link);
            current_len = link_len;
        } else {
            current.push('\n');
            current.push_str(link);
            current_len += 1 + link_len;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
