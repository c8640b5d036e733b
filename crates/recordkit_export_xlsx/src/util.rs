//! Stateless helper utilities used by the formatter and document builder.

use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset};
use regex::Regex;

use crate::conf::{
    C_WRAP_SENTINEL, N_LEN_EXCEL_SHEET_NAME_MAX, TUP_EXCEL_ILLEGAL, TUP_URL_PREFIX_SUPPORTED,
};

static RE_HTML_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<!--.*?-->|</?[A-Za-z!?][^>]*>").expect("valid HTML tag pattern")
});

////////////////////////////////////////////////////////////////////////////////
// #region TextCleanup

/// Remove HTML tags and comments, keeping text content.
///
/// A `<` not followed by a tag name is kept as literal text.
pub fn strip_html_tags(text: &str) -> String {
    RE_HTML_TAG.replace_all(text, "").into_owned()
}

/// Remove `\r\n`, `\r` and `\n` sequences.
pub fn remove_line_breaks(text: &str) -> String {
    text.replace("\r\n", "").replace(['\r', '\n'], "")
}

/// Flatten rich text to a single plain line.
pub fn flatten_rich_text(text: &str) -> String {
    remove_line_breaks(&strip_html_tags(text))
}

/// Split a comma-delimited id list (`"4, 7, 12"`) into trimmed ids.
pub fn parse_reference_ids(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|c_id| !c_id.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Whether `url` is absolute with a scheme usable as a sheet hyperlink.
pub fn is_hyperlink_url(url: &str) -> bool {
    let c_url = url.trim().to_ascii_lowercase();
    TUP_URL_PREFIX_SUPPORTED
        .iter()
        .any(|c_prefix| c_url.len() > c_prefix.len() && c_url.starts_with(c_prefix))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Truncation

/// Wrap `text` at `width` characters by inserting `break_token`.
///
/// Lines break at spaces (the space is replaced by the token); words longer
/// than `width` are hard-cut. Break tokens already present in the input reset
/// the line.
pub fn wrap_words(text: &str, width: usize, break_token: &str) -> String {
    let l_chars: Vec<char> = text.chars().collect();
    let l_break: Vec<char> = break_token.chars().collect();
    let n_len = l_chars.len();
    let n_len_break = l_break.len();

    if n_len == 0 || n_len_break == 0 {
        return text.to_string();
    }

    let mut l_out: Vec<char> = Vec::with_capacity(n_len + n_len_break * (n_len / width.max(1)));
    let mut n_last_start = 0usize;
    let mut n_last_space = 0usize;
    let mut n_cursor = 0usize;

    while n_cursor < n_len {
        let chr = l_chars[n_cursor];
        if chr == l_break[0]
            && n_cursor + n_len_break < n_len
            && l_chars[n_cursor..n_cursor + n_len_break] == l_break[..]
        {
            l_out.extend_from_slice(&l_chars[n_last_start..n_cursor + n_len_break]);
            n_cursor += n_len_break - 1;
            n_last_start = n_cursor + 1;
            n_last_space = n_cursor + 1;
        } else if chr == ' ' {
            if n_cursor - n_last_start >= width {
                l_out.extend_from_slice(&l_chars[n_last_start..n_cursor]);
                l_out.extend_from_slice(&l_break);
                n_last_start = n_cursor + 1;
            }
            n_last_space = n_cursor;
        } else if n_cursor - n_last_start >= width && n_last_start >= n_last_space {
            l_out.extend_from_slice(&l_chars[n_last_start..n_cursor]);
            l_out.extend_from_slice(&l_break);
            n_last_start = n_cursor;
            n_last_space = n_cursor;
        } else if n_cursor - n_last_start >= width && n_last_start < n_last_space {
            l_out.extend_from_slice(&l_chars[n_last_start..n_last_space]);
            l_out.extend_from_slice(&l_break);
            n_last_start = n_last_space + 1;
            n_last_space = n_last_start;
        }
        n_cursor += 1;
    }

    if n_last_start < n_len {
        l_out.extend_from_slice(&l_chars[n_last_start..]);
    }

    l_out.into_iter().collect()
}

/// Strip tags and shorten `text` to its first wrapped line plus `ellipsis`
/// when it has `limit` or more characters.
///
/// Text that fits in one wrapped line (exactly `limit` characters with no
/// break opportunity) is kept whole before the ellipsis.
pub fn cut_str(text: &str, limit: usize, ellipsis: &str) -> String {
    let c_text = strip_html_tags(text);
    if c_text.chars().count() < limit {
        return c_text;
    }

    let c_wrapped = wrap_words(&c_text, limit, C_WRAP_SENTINEL);
    let c_head = match c_wrapped.find(C_WRAP_SENTINEL) {
        Some(n_pos) => &c_wrapped[..n_pos],
        None => c_text.as_str(),
    };
    format!("{c_head}{ellipsis}")
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Timestamps

/// Format Unix seconds as `"January 5, 2021, 9:05 am"` in `offset`.
pub fn format_timestamp(secs: i64, offset: &FixedOffset) -> Option<String> {
    let dt = DateTime::from_timestamp(secs, 0)?.with_timezone(offset);
    Some(dt.format("%B %-d, %Y, %-I:%M %P").to_string())
}

/// Build a fixed offset from minutes east of UTC.
pub fn derive_utc_offset(minutes: i32) -> Option<FixedOffset> {
    FixedOffset::east_opt(minutes.checked_mul(60)?)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetNormalization

/// Replace invalid chars and trim to valid Excel sheet name.
pub fn sanitize_sheet_name(name: &str, replace_to: &str) -> String {
    let mut c_name = name.to_string();
    for c_illegal in TUP_EXCEL_ILLEGAL {
        c_name = c_name.replace(c_illegal, replace_to);
    }
    c_name = c_name.trim().trim_matches('\'').trim().to_string();
    if c_name.is_empty() {
        c_name = "Sheet".to_string();
    }

    c_name
        .chars()
        .take(N_LEN_EXCEL_SHEET_NAME_MAX)
        .collect::<String>()
        .trim_end()
        .to_string()
}

/// Estimate displayed width units of a string; wide glyphs count 1.6.
pub fn estimate_unicode_string_width(s: &str) -> usize {
    let n_ascii = s.chars().filter(|chr| chr.is_ascii()).count();
    let n_non_ascii = s.chars().count().saturating_sub(n_ascii);
    n_ascii + (n_non_ascii as f64 * 1.6).round() as usize
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_words_breaks_at_spaces() {
        assert_eq!(
            wrap_words("The quick brown fox jumps over the lazy dog", 10, "|"),
            "The quick|brown fox|jumps over|the lazy|dog"
        );
    }

    #[test]
    fn test_wrap_words_hard_cuts_long_words() {
        assert_eq!(
            wrap_words("A very long woooooooooooooooord.", 8, "|"),
            "A very|long|wooooooo|oooooooo|ord."
        );
    }

    #[test]
    fn test_cut_str_keeps_short_text() {
        assert_eq!(cut_str("short title", 30, " …"), "short title");
        assert_eq!(cut_str("<b>short</b> title", 30, " …"), "short title");
    }

    #[test]
    fn test_cut_str_truncates_at_word_boundary() {
        assert_eq!(
            cut_str("Annual report on regional water quality 2021", 30, " …"),
            "Annual report on regional …"
        );
        assert_eq!(
            cut_str("Quarterly budget review for the northern district", 30, " …"),
            "Quarterly budget review for …"
        );
    }

    #[test]
    fn test_cut_str_hard_cuts_unbroken_text() {
        let c_input = "a".repeat(31);
        let c_out = cut_str(&c_input, 30, " …");
        assert_eq!(c_out, format!("{} …", "a".repeat(30)));
        assert!(c_out.ends_with(" …"));
        assert!(c_out.chars().count() <= 30 + " …".chars().count());
    }

    #[test]
    fn test_cut_str_counts_characters_not_bytes() {
        let c_input = "é".repeat(20);
        assert_eq!(cut_str(&c_input, 30, " …"), c_input);
    }

    #[test]
    fn test_cut_str_without_break_keeps_whole_text() {
        let c_input = "abcd efgh ijkl mnop qrst uvwxy";
        assert_eq!(c_input.chars().count(), 30);
        assert_eq!(cut_str(c_input, 30, " …"), format!("{c_input} …"));
    }

    #[test]
    fn test_cut_str_is_idempotent_on_short_output() {
        let c_once = cut_str("Meeting notes", 30, " …");
        assert_eq!(cut_str(&c_once, 30, " …"), c_once);
    }

    #[test]
    fn test_flatten_rich_text() {
        assert_eq!(
            flatten_rich_text("<p>First line</p>\r\n<p>Second <em>line</em></p>\nEnd\r"),
            "First lineSecond lineEnd"
        );
        assert_eq!(strip_html_tags("1 < 2 <!-- note -->ok"), "1 < 2 ok");
    }

    #[test]
    fn test_parse_reference_ids() {
        assert_eq!(parse_reference_ids("4, 7, 12"), vec!["4", "7", "12"]);
        assert_eq!(parse_reference_ids(" 4,,7 ,"), vec!["4", "7"]);
        assert!(parse_reference_ids("").is_empty());
    }

    #[test]
    fn test_format_timestamp() {
        let utc = derive_utc_offset(0).expect("offset");
        assert_eq!(
            format_timestamp(1_609_837_500, &utc).as_deref(),
            Some("January 5, 2021, 9:05 am")
        );
        assert_eq!(
            format_timestamp(1_609_882_200, &utc).as_deref(),
            Some("January 5, 2021, 9:30 pm")
        );
        assert_eq!(
            format_timestamp(1_609_805_220, &utc).as_deref(),
            Some("January 5, 2021, 12:07 am")
        );

        let cest = derive_utc_offset(120).expect("offset");
        assert_eq!(
            format_timestamp(1_609_837_500, &cest).as_deref(),
            Some("January 5, 2021, 11:05 am")
        );
    }

    #[test]
    fn test_is_hyperlink_url() {
        assert!(is_hyperlink_url("https://example.org/files/cover.png"));
        assert!(is_hyperlink_url("HTTP://example.org"));
        assert!(is_hyperlink_url("mailto:office@example.org"));
        assert!(!is_hyperlink_url("/sites/default/files/cover.png"));
        assert!(!is_hyperlink_url("public://cover.png"));
        assert!(!is_hyperlink_url("https://"));
    }

    #[test]
    fn test_sanitize_sheet_name() {
        assert_eq!(sanitize_sheet_name("Q1/Q2: [draft]", "_"), "Q1_Q2_ _draft_");
        assert_eq!(sanitize_sheet_name("   ", "_"), "Sheet");
        assert_eq!(
            sanitize_sheet_name("Quarterly budget review for …", "_"),
            "Quarterly budget review for …"
        );
        assert_eq!(
            sanitize_sheet_name(&"x".repeat(40), "_").chars().count(),
            N_LEN_EXCEL_SHEET_NAME_MAX
        );
    }
}
