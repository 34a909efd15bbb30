//! テキスト読み込み
//!
//! ファイル全体をUTF-8テキストとして読み込み、改行コードを推定して
//! 行単位に分割する。ファイルハンドルは呼び出しの間保持しない

use crate::error::{LineIoError, Result};
use crate::path;
use std::fs;
use std::path::PathBuf;
use url::Url;

/// 改行コード
///
/// 入力として認識するのは LF と CRLF のみ。単独 CR は改行として扱わない
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    Lf,
    Crlf,
}

impl LineEnding {
    /// 区切り文字列としての表現
    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::Crlf => "\r\n",
        }
    }
}

/// 読み込み元の位置
#[derive(Debug, Clone)]
pub enum SourceLocation {
    /// 解決済みローカルパス
    Local(PathBuf),
    /// 任意のURL（存在確認は読み込み時に委ねる）
    Remote(Url),
}

/// テキスト読み込みソース
///
/// `raw_contents` は明示的な読み込みで、`lines` は明示的な分割で
/// それぞれ設定される。`lines` は派生データであり、`raw_contents` が
/// 変わったら分割し直すまで無効
#[derive(Debug, Clone)]
pub struct TextSource {
    display_name: String,
    location: SourceLocation,
    raw_contents: String,
    lines: Vec<String>,
}

impl TextSource {
    /// ローカルファイル名からソースを作成
    ///
    /// パスの妥当性はここでは確認しない（読み込み時にチェックされる）
    pub fn new(name: impl Into<String>) -> Self {
        let display_name = name.into();
        let location = SourceLocation::Local(path::resolve(&display_name));
        TextSource {
            display_name,
            location,
            raw_contents: String::new(),
            lines: Vec::new(),
        }
    }

    /// 表示名とURL文字列からソースを作成
    ///
    /// URLとして解釈できない文字列は構築時点で失敗する。
    /// パスらしさや存在の確認はしない
    pub fn with_url(display_name: impl Into<String>, url: &str) -> Result<Self> {
        let display_name = display_name.into();
        let parsed = Url::parse(url).map_err(|e| {
            LineIoError::read(format!("{}: invalid URL \"{}\": {}", display_name, url, e))
        })?;

        Ok(TextSource {
            display_name,
            location: SourceLocation::Remote(parsed),
            raw_contents: String::new(),
            lines: Vec::new(),
        })
    }

    /// 呼び出し元が与えた表示名
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// 読み込み元の位置
    pub fn location(&self) -> &SourceLocation {
        &self.location
    }

    /// 読み込み済みの全文
    pub fn raw_contents(&self) -> &str {
        &self.raw_contents
    }

    /// 分割済みの行
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// ファイル全体をUTF-8テキストとして読み込む
    ///
    /// ローカルソースは存在を事前確認し、存在しなければ読み込み失敗。
    /// URLソースは事前確認せず、取得自体の成否に委ねる
    pub fn read_contents(&mut self) -> Result<()> {
        let text = match &self.location {
            SourceLocation::Local(path) => {
                if !path.exists() {
                    return Err(LineIoError::read(format!(
                        "{}: no such file",
                        self.display_name
                    )));
                }
                fs::read_to_string(path).map_err(|e| {
                    LineIoError::read(format!("{}: {}", self.display_name, e))
                })?
            }
            SourceLocation::Remote(url) => match url.scheme() {
                "file" => {
                    let local = url.to_file_path().map_err(|_| {
                        LineIoError::read(format!(
                            "{}: URL has no usable local path: {}",
                            self.display_name, url
                        ))
                    })?;
                    fs::read_to_string(&local).map_err(|e| {
                        LineIoError::read(format!("{}: {}", self.display_name, e))
                    })?
                }
                scheme => {
                    return Err(LineIoError::read(format!(
                        "{}: cannot fetch \"{}\" scheme URL: {}",
                        self.display_name, scheme, url
                    )));
                }
            },
        };

        // UTF-8 BOM は本文から除去する
        self.raw_contents = match text.strip_prefix('\u{FEFF}') {
            Some(stripped) => stripped.to_string(),
            None => text,
        };
        // 派生データを無効化
        self.lines.clear();
        Ok(())
    }

    /// 改行コードの推定
    ///
    /// 単独の `\n`（直前が `\r` でないもの）が文中のどこかにあれば LF。
    /// なければ `\r\n` の有無で CRLF。どちらも無ければ None。
    /// 優先順位は出現位置に依らず固定
    pub fn choose_newline(&self) -> Option<LineEnding> {
        let bytes = self.raw_contents.as_bytes();
        let mut saw_crlf = false;

        for (i, &b) in bytes.iter().enumerate() {
            if b == b'\n' {
                if i > 0 && bytes[i - 1] == b'\r' {
                    saw_crlf = true;
                } else {
                    return Some(LineEnding::Lf);
                }
            }
        }

        if saw_crlf {
            Some(LineEnding::Crlf)
        } else {
            None
        }
    }

    /// 区切りで行に分割する
    ///
    /// 区切り未指定時は LF。末尾に連続する空フィールド（ちょうど1つの
    /// 改行で終わるファイルが生む空の尻尾）は落とし、途中の空行は残す
    pub fn split_lines(&mut self, newline: Option<LineEnding>) {
        let separator = newline.unwrap_or(LineEnding::Lf).as_str();

        let mut fields: Vec<String> = self
            .raw_contents
            .split(separator)
            .map(str::to_string)
            .collect();
        while fields.last().map(|f| f.is_empty()).unwrap_or(false) {
            fields.pop();
        }

        self.lines = fields;
    }

    /// 読み込み・改行推定・分割をまとめて行い、行列を返す
    pub fn read(&mut self, newline: Option<LineEnding>) -> Result<&[String]> {
        self.read_contents()?;
        let separator = newline.or_else(|| self.choose_newline());
        self.split_lines(separator);
        Ok(&self.lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn source_with_contents(contents: &str) -> TextSource {
        let mut source = TextSource::new("in-memory");
        source.raw_contents = contents.to_string();
        source
    }

    #[test]
    fn test_choose_newline_prefers_bare_lf() {
        // 先に CRLF が現れても、後ろの単独 LF が勝つ
        let source = source_with_contents("first\r\nsecond\nthird");
        assert_eq!(source.choose_newline(), Some(LineEnding::Lf));
    }

    #[test]
    fn test_choose_newline_crlf_only() {
        let source = source_with_contents("first\r\nsecond\r\n");
        assert_eq!(source.choose_newline(), Some(LineEnding::Crlf));
    }

    #[test]
    fn test_choose_newline_none() {
        let source = source_with_contents("no line breaks here");
        assert_eq!(source.choose_newline(), None);

        // 単独 CR は改行として検出されない
        let source = source_with_contents("classic\rmac");
        assert_eq!(source.choose_newline(), None);
    }

    #[test]
    fn test_split_basic() {
        let mut source = source_with_contents("hi,\nmom\nit's \nme\n");
        let newline = source.choose_newline();
        source.split_lines(newline);
        assert_eq!(source.lines(), &["hi,", "mom", "it's ", "me"]);
    }

    #[test]
    fn test_split_empty_and_separator_only() {
        let mut source = source_with_contents("");
        source.split_lines(Some(LineEnding::Lf));
        assert!(source.lines().is_empty());

        let mut source = source_with_contents("\n\n");
        source.split_lines(Some(LineEnding::Lf));
        assert!(source.lines().is_empty());
    }

    #[test]
    fn test_split_without_separator_yields_whole_text() {
        let mut source = source_with_contents("single line, no newline");
        source.split_lines(Some(LineEnding::Lf));
        assert_eq!(source.lines(), &["single line, no newline"]);
    }

    #[test]
    fn test_split_keeps_interior_blank_lines() {
        let mut source = source_with_contents("alpha\n\nbeta\n");
        source.split_lines(Some(LineEnding::Lf));
        assert_eq!(source.lines(), &["alpha", "", "beta"]);
    }

    #[test]
    fn test_split_crlf() {
        let mut source = source_with_contents("one\r\ntwo\r\n");
        source.split_lines(Some(LineEnding::Crlf));
        assert_eq!(source.lines(), &["one", "two"]);
    }

    #[test]
    fn test_read_nonexistent_file_fails() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing.txt");

        let mut source = TextSource::new(missing.to_str().unwrap());
        let err = source.read(None).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Read);
        assert!(err.message_contains("missing.txt"));
    }

    #[test]
    fn test_read_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("poem.txt");
        fs::write(&file_path, "line one\nline two\n").unwrap();

        let mut source = TextSource::new(file_path.to_str().unwrap());
        let lines = source.read(None).unwrap().to_vec();
        assert_eq!(lines, vec!["line one", "line two"]);
        assert_eq!(source.raw_contents(), "line one\nline two\n");
    }

    #[test]
    fn test_read_strips_bom() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("bom.txt");
        fs::write(&file_path, "\u{FEFF}content\n").unwrap();

        let mut source = TextSource::new(file_path.to_str().unwrap());
        source.read_contents().unwrap();
        assert_eq!(source.raw_contents(), "content\n");
    }

    #[test]
    fn test_with_url_rejects_garbage() {
        let err = TextSource::with_url("bad", "http://[broken").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Read);
        assert!(err.message_contains("bad"));
    }

    #[test]
    fn test_file_url_source() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("remote.txt");
        fs::write(&file_path, "via url\n").unwrap();

        let url = format!("file://{}", file_path.display());
        let mut source = TextSource::with_url("remote.txt", &url).unwrap();
        let lines = source.read(None).unwrap().to_vec();
        assert_eq!(lines, vec!["via url"]);
    }

    #[test]
    fn test_unsupported_scheme_fails_on_read() {
        // 構築は成功し、読み込みで初めて失敗する
        let mut source = TextSource::with_url("api", "https://example.com/data.txt").unwrap();
        let err = source.read_contents().unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Read);
        assert!(err.message_contains("https"));
    }

    #[test]
    fn test_reading_invalidates_previous_split() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("twice.txt");
        fs::write(&file_path, "a\nb\n").unwrap();

        let mut source = TextSource::new(file_path.to_str().unwrap());
        source.read(None).unwrap();
        assert_eq!(source.lines().len(), 2);

        fs::write(&file_path, "only\n").unwrap();
        source.read_contents().unwrap();
        // 分割し直すまで派生データは空
        assert!(source.lines().is_empty());
    }
}
