//! Per-line encodings and digests

use crate::tool::output::{Stats, TransformOutput};
use crate::tool::params::ParamReader;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use linesmith_foundation::{Error, Result};
use sha2::Digest;

/// base64 / URL 인코딩. 실패한 줄은 `[encode error: ...]`
pub fn encode(lines: &[String], p: &ParamReader) -> TransformOutput {
    let mode = p.choice("mode", "b64encode");
    let mut errors = 0;

    let out = lines
        .iter()
        .map(|line| {
            if line.is_empty() {
                return String::new();
            }
            match encode_line(line, &mode) {
                Ok(encoded) => encoded,
                Err(message) => {
                    errors += 1;
                    format!("[encode error: {}]", message)
                }
            }
        })
        .collect();

    let mut stats = Stats::new();
    if errors > 0 {
        stats.set_count("errors", errors);
    }
    TransformOutput::new(out).with_stats(stats)
}

fn encode_line(line: &str, mode: &str) -> std::result::Result<String, String> {
    match mode {
        "b64encode" => Ok(STANDARD.encode(line.as_bytes())),
        "b64decode" => {
            let compact: String = line.chars().filter(|c| !c.is_whitespace()).collect();
            let bytes = STANDARD.decode(compact).map_err(|e| e.to_string())?;
            String::from_utf8(bytes).map_err(|_| "decoded bytes are not valid UTF-8".to_string())
        }
        "urlencode" => Ok(encode_uri_component(line)),
        "urldecode" => urlencoding::decode(line)
            .map(|s| s.into_owned())
            .map_err(|e| e.to_string()),
        _ => Ok(line.to_string()),
    }
}

/// `encodeURIComponent`와 같은 문자 집합 (`!'()*`는 그대로)
fn encode_uri_component(s: &str) -> String {
    urlencoding::encode(s)
        .replace("%21", "!")
        .replace("%27", "'")
        .replace("%28", "(")
        .replace("%29", ")")
        .replace("%2A", "*")
}

pub const HASH_ALGORITHMS: [&str; 10] = [
    "crc32", "md5", "sha1", "sha224", "sha256", "sha384", "sha512", "sha3", "ripemd160", "blake3",
];

/// 줄마다 소문자 hex 다이제스트
///
/// `sha3`는 Keccak-512 (NIST 패딩 이전 버전)
pub fn hash(lines: &[String], p: &ParamReader) -> Result<TransformOutput> {
    let algorithm = p.choice("algorithm", "md5");
    let digest: fn(&[u8]) -> String = match algorithm.as_str() {
        "crc32" => |b| format!("{:08x}", crc32fast::hash(b)),
        "md5" => hex_digest::<md5::Md5>,
        "sha1" => hex_digest::<sha1::Sha1>,
        "sha224" => hex_digest::<sha2::Sha224>,
        "sha256" => hex_digest::<sha2::Sha256>,
        "sha384" => hex_digest::<sha2::Sha384>,
        "sha512" => hex_digest::<sha2::Sha512>,
        "sha3" => hex_digest::<sha3::Keccak512>,
        "ripemd160" => hex_digest::<ripemd::Ripemd160>,
        "blake3" => |b| blake3::hash(b).to_hex().to_string(),
        other => {
            return Err(Error::Validation(format!(
                "Unknown hash algorithm: {}",
                other
            )))
        }
    };

    let out = lines.iter().map(|line| digest(line.as_bytes())).collect();
    Ok(TransformOutput::new(out))
}

fn hex_digest<D: Digest>(bytes: &[u8]) -> String {
    ::hex::encode(D::digest(bytes))
}
