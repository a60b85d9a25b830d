//! Hex rendering and decoding

use crate::tool::output::{Stats, TransformOutput};
use crate::tool::params::ParamReader;
use linesmith_foundation::{Error, Result};

const DUMP_ROW: usize = 16;
const DUMP_HEX_WIDTH: usize = 50;

fn encode_text(line: &str, encoding: &str) -> Vec<u8> {
    match encoding {
        "utf-16le" => line.encode_utf16().flat_map(u16::to_le_bytes).collect(),
        "utf-16be" => line.encode_utf16().flat_map(u16::to_be_bytes).collect(),
        _ => line.as_bytes().to_vec(),
    }
}

fn decode_text(bytes: &[u8], encoding: &str) -> String {
    let units = |to_u16: fn([u8; 2]) -> u16| {
        let mut text = String::from_utf16_lossy(
            &bytes
                .chunks_exact(2)
                .map(|pair| to_u16([pair[0], pair[1]]))
                .collect::<Vec<u16>>(),
        );
        if bytes.len() % 2 == 1 {
            text.push(char::REPLACEMENT_CHARACTER);
        }
        text
    };
    match encoding {
        "utf-16le" => units(u16::from_le_bytes),
        "utf-16be" => units(u16::from_be_bytes),
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// 줄마다 바이트를 hex로 (plain / spaced / dump / dump_ascii)
pub fn to_hex(lines: &[String], p: &ParamReader) -> TransformOutput {
    let encoding = p.choice("encoding", "utf-8");
    let format = p.choice("format", "spaced");
    let uppercase = p.flag("uppercase");

    let byte_hex = |b: &u8| {
        if uppercase {
            format!("{:02X}", b)
        } else {
            format!("{:02x}", b)
        }
    };

    let mut out = Vec::new();
    for line in lines {
        let bytes = encode_text(line, &encoding);
        match format.as_str() {
            "plain" => out.push(bytes.iter().map(byte_hex).collect::<String>()),
            "dump" | "dump_ascii" => {
                for (row, chunk) in bytes.chunks(DUMP_ROW).enumerate() {
                    let mut hex = String::new();
                    for (j, b) in chunk.iter().enumerate() {
                        hex.push_str(&byte_hex(b));
                        hex.push_str(if j == 7 { "  " } else { " " });
                    }
                    let mut row_text = format!(
                        "{:08X}: {:<width$}",
                        row * DUMP_ROW,
                        hex,
                        width = DUMP_HEX_WIDTH
                    );
                    if format == "dump_ascii" {
                        let ascii: String = chunk
                            .iter()
                            .map(|&b| if b >= 32 { char::from(b) } else { '.' })
                            .collect();
                        row_text.push_str(&format!(" |{}|", ascii));
                    }
                    out.push(row_text);
                }
            }
            _ => out.push(bytes.iter().map(byte_hex).collect::<Vec<_>>().join(" ")),
        }
    }
    TransformOutput::new(out)
}

/// 모든 hex 숫자를 모아 텍스트로 복원 후 `\n`으로 분할
///
/// 덤프 형식의 오프셋(`...:`)과 `|ascii|` 영역은 무시합니다.
pub fn from_hex(lines: &[String], p: &ParamReader) -> Result<TransformOutput> {
    let encoding = p.choice("encoding", "utf-8");
    let mut bytes = Vec::new();

    for (index, raw) in lines.iter().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        let line_no = index + 1;

        let hex_part = match line.split_once(':') {
            Some((_, rest)) => rest.split('|').next().unwrap_or(""),
            None => line,
        };

        let mut invalid: Vec<char> = Vec::new();
        for c in hex_part.chars() {
            if !c.is_ascii_hexdigit() && !c.is_whitespace() && !invalid.contains(&c) {
                invalid.push(c);
            }
        }
        if !invalid.is_empty() {
            let listed: Vec<String> = invalid.iter().map(|c| c.to_string()).collect();
            return Err(Error::Validation(format!(
                "Invalid hex characters on line {}: {}",
                line_no,
                listed.join(" ")
            )));
        }

        let digits: Vec<u8> = hex_part
            .chars()
            .filter_map(|c| c.to_digit(16))
            .map(|d| d as u8)
            .collect();
        if digits.len() % 2 != 0 {
            return Err(Error::Validation(format!(
                "Incomplete hex byte on line {}",
                line_no
            )));
        }
        bytes.extend(digits.chunks_exact(2).map(|pair| pair[0] << 4 | pair[1]));
    }

    if bytes.is_empty() {
        return Err(Error::Validation("No hex data found".to_string()));
    }

    let decoded = decode_text(&bytes, &encoding);
    let out = decoded.split('\n').map(str::to_string).collect();
    Ok(TransformOutput::new(out).with_stats(Stats::new().count("bytes", bytes.len())))
}
