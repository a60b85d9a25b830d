//! Builtin tool catalog (카테고리 순서 = 표시 순서)

use super::builtin::codec;
use super::definition::{Category, ToolDefinition};
use super::kind::ToolKind;
use super::schema::ParamSpec;

const JOIN_DELIMS: &[&str] = &["\\n", "", " "];

/// 모든 builtin 도구 정의
pub fn builtin_definitions() -> Vec<ToolDefinition> {
    let mut defs = Vec::new();
    defs.extend(search_clean());
    defs.extend(remove_filter());
    defs.extend(order_compare());
    defs.extend(text_transform());
    defs.extend(formats());
    defs.extend(assembly());
    defs
}

// ============================================================================
// Search & Clean
// ============================================================================

fn search_clean() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition::new("regex", Category::SearchClean, ToolKind::Regex)
            .title("Search and Replace (Regex)")
            .description("Replace using a regular expression")
            .help("https://en.wikipedia.org/wiki/Regular_expression")
            .param(ParamSpec::text("pattern", r"\d+"))
            .param(ParamSpec::text("replacement", ""))
            .param(ParamSpec::checkbox("caseInsensitive", false))
            .param(ParamSpec::checkbox("onlyMatched", false)),
        ToolDefinition::new("clean_text", Category::SearchClean, ToolKind::CleanText)
            .title("Text Cleaner")
            .description("Normalise typography and replace special characters")
            .alias("ai_cleaner")
            .param(ParamSpec::text("replaceStr", "")),
    ]
}

// ============================================================================
// Remove & Filter
// ============================================================================

fn remove_filter() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition::new("dedup", Category::RemoveFilter, ToolKind::Dedup)
            .title("Remove Duplicates")
            .description("Keeps only unique lines")
            .alias("deduplicate")
            .param(ParamSpec::checkbox("trim", true)),
        ToolDefinition::new("duplicates", Category::RemoveFilter, ToolKind::Duplicates)
            .title("Find Duplicates")
            .description("Shows only repeating lines")
            .param(ParamSpec::checkbox("showCounts", true)),
        ToolDefinition::new("filter", Category::RemoveFilter, ToolKind::Filter)
            .title("Line Filter")
            .description("Keep or remove lines by condition")
            .param(ParamSpec::text("query", ""))
            .param(ParamSpec::select(
                "mode",
                &["contains", "not_contains", "starts", "ends"],
                "contains",
            ))
            .param(ParamSpec::checkbox("caseSensitive", true)),
    ]
}

// ============================================================================
// Order & Compare
// ============================================================================

fn order_compare() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition::new("sort", Category::OrderCompare, ToolKind::Sort)
            .title("Sort")
            .description("Sorts the list")
            .param(ParamSpec::select("mode", &["text", "numeric", "smart"], "text"))
            .param(ParamSpec::select("direction", &["asc", "desc"], "asc"))
            .param(ParamSpec::checkbox("caseInsensitive", false)),
        ToolDefinition::new("reverse", Category::OrderCompare, ToolKind::Reverse)
            .title("Reverse")
            .description("Reverses the list of lines"),
        ToolDefinition::new("shuffle", Category::OrderCompare, ToolKind::Shuffle)
            .title("Random Shuffle")
            .description("Shuffles lines in a seeded random order")
            .param(ParamSpec::text("seed", "")),
        ToolDefinition::new("compare", Category::OrderCompare, ToolKind::Compare)
            .title("Compare (Diff)")
            .description("Compare incoming lines with a second list")
            .param(ParamSpec::textarea("secondList", ""))
            .param(ParamSpec::delimiter("listDelimiter", "\\n"))
            .param(
                ParamSpec::select(
                    "operation",
                    &["common", "onlyFirst", "onlySecond", "all"],
                    "common",
                )
                .accepting(&["diff"]),
            ),
    ]
}

// ============================================================================
// Text Transform
// ============================================================================

fn text_transform() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition::new("case", Category::TextTransform, ToolKind::Case)
            .title("Case")
            .description("UPPERCASE, lowercase, Sentence case, Word Case")
            .param(ParamSpec::select("mode", &["upper", "lower", "cap", "word"], "lower")),
        ToolDefinition::new("trim", Category::TextTransform, ToolKind::Trim)
            .title("Trim")
            .description("Removes whitespace from the edges of each line")
            .param(ParamSpec::select("mode", &["both", "left", "right"], "both")),
        ToolDefinition::new("wrapper", Category::TextTransform, ToolKind::Wrapper)
            .title("Wrapper (Prefix/Suffix)")
            .description("Add text to the beginning and end of each line")
            .param(ParamSpec::text("prefix", ""))
            .param(ParamSpec::text("suffix", "")),
    ]
}

// ============================================================================
// Formats
// ============================================================================

fn formats() -> Vec<ToolDefinition> {
    let encodings: &[&str] = &["utf-8", "utf-16le", "utf-16be"];
    vec![
        ToolDefinition::new("csv", Category::Formats, ToolKind::Csv)
            .title("CSV Parser")
            .description("Convert CSV rows to text by template")
            .param(ParamSpec::delimiter("delimiter", ";"))
            .param(ParamSpec::text("template", "$1 - $2"))
            .param(ParamSpec::checkbox("skipHeader", false)),
        ToolDefinition::new("json_format", Category::Formats, ToolKind::JsonFormat)
            .title("JSON Formatting")
            .description("Pretty-print or minify JSON")
            .param(ParamSpec::select("indent", &["2", "4", "tab", "0"], "2"))
            .param(ParamSpec::select("joinDelim", JOIN_DELIMS, "\\n")),
        ToolDefinition::new("json_path", Category::Formats, ToolKind::JsonPath)
            .title("Extraction (JSONPath)")
            .description("Extracts elements from JSON text (e.g. $.users[*].name)")
            .help("https://www.rfc-editor.org/rfc/rfc9535")
            .param(ParamSpec::text("query", "$.*"))
            .param(ParamSpec::select("inputMode", &["combined", "lines"], "combined"))
            .param(ParamSpec::select("joinDelim", JOIN_DELIMS, "\\n"))
            .param(ParamSpec::checkbox("stringify", true)),
        ToolDefinition::new("split", Category::Formats, ToolKind::Split)
            .title("Split String")
            .description("Splits lines by delimiter")
            .param(ParamSpec::delimiter("delimiter", ",")),
        ToolDefinition::new("encode", Category::Formats, ToolKind::Encode)
            .title("Encoding (Base64/URL)")
            .description("Encode and decode Base64 or URL components")
            .param(ParamSpec::select(
                "mode",
                &["b64encode", "b64decode", "urlencode", "urldecode"],
                "b64encode",
            )),
        ToolDefinition::new("hash", Category::Formats, ToolKind::Hash)
            .title("Hashing")
            .description("Calculates CRC32, MD5, SHA-1, SHA-2, SHA-3, RIPEMD-160 or BLAKE3 per line")
            .param(ParamSpec::select("algorithm", &codec::HASH_ALGORITHMS, "md5")),
        ToolDefinition::new("to_hex", Category::Formats, ToolKind::ToHex)
            .title("To HEX")
            .description("Convert text to hexadecimal code")
            .param(ParamSpec::select("encoding", encodings, "utf-8"))
            .param(ParamSpec::select(
                "format",
                &["plain", "spaced", "dump", "dump_ascii"],
                "spaced",
            ))
            .param(ParamSpec::checkbox("uppercase", true)),
        ToolDefinition::new("from_hex", Category::Formats, ToolKind::FromHex)
            .title("From HEX")
            .description("Convert hexadecimal code back to text")
            .param(ParamSpec::select("encoding", encodings, "utf-8")),
    ]
}

// ============================================================================
// Assembly
// ============================================================================

fn assembly() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition::new("join", Category::Assembly, ToolKind::Join)
            .title("Join Lines")
            .description("Assembles the list into a single line")
            .param(ParamSpec::text("prefix", ""))
            .param(ParamSpec::delimiter("delimiter", ", "))
            .param(ParamSpec::delimiter("lastDelimiter", " and "))
            .param(ParamSpec::text("suffix", "")),
        ToolDefinition::new("add_line", Category::Assembly, ToolKind::AddLine)
            .title("Add Line")
            .description("Adds lines at the start, the end and/or between lines")
            .param(ParamSpec::text("startLine", ""))
            .param(ParamSpec::text("betweenLines", ""))
            .param(ParamSpec::text("endLine", "")),
        ToolDefinition::new("js_function", Category::Assembly, ToolKind::JsFunction)
            .title("Function (JS)")
            .description("Custom script evaluated for each line")
            .param(ParamSpec::textarea("code", "return line.toUpperCase();")),
    ]
}
