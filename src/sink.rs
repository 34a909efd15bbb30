//! テキスト書き込み
//!
//! 出力をメモリ上に蓄積し、要求に応じてアトミック上書きまたは
//! バックアップ保持付きの安全書き込みでディスクへ確定する。
//! ストリーミング構成では蓄積を行わず、与えられたストリームへ即時出力する

use crate::error::{LineIoError, Result};
use crate::path;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// ストリーミング出力先
///
/// 標準出力・標準エラーの事前配線済みターゲットに加え、
/// 呼び出し元が任意の書き込み先を差し込める
pub enum StreamTarget {
    Stdout,
    Stderr,
    Custom(Box<dyn Write>),
}

impl StreamTarget {
    fn write_all(&mut self, text: &str) -> io::Result<()> {
        match self {
            StreamTarget::Stdout => {
                let mut out = io::stdout();
                out.write_all(text.as_bytes())?;
                out.flush()
            }
            StreamTarget::Stderr => {
                let mut err = io::stderr();
                err.write_all(text.as_bytes())?;
                err.flush()
            }
            StreamTarget::Custom(writer) => writer.write_all(text.as_bytes()),
        }
    }
}

impl std::fmt::Debug for StreamTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamTarget::Stdout => f.write_str("StreamTarget::Stdout"),
            StreamTarget::Stderr => f.write_str("StreamTarget::Stderr"),
            StreamTarget::Custom(_) => f.write_str("StreamTarget::Custom(..)"),
        }
    }
}

/// シンクの構成
///
/// 継承ではなく構築時に選ぶ閉じた変種の集合。
/// すべての書き込みは単一の `base_write` を通るため、
/// 変種の差はその一点で吸収される
#[derive(Debug)]
enum SinkKind {
    /// ディスク確定までメモリに蓄積
    Buffered { path: PathBuf, accumulated: String },
    /// ストリームへ即時出力（蓄積バッファは使わない）
    Streaming { target: StreamTarget },
}

/// テキスト書き込みシンク
pub struct TextSink {
    display_name: String,
    prefix: String,
    has_been_used: bool,
    kind: SinkKind,
}

impl TextSink {
    /// ディスク確定型シンクを作成
    ///
    /// パスは構築時に解決されるが、妥当性の確認は確定時まで行わない
    pub fn buffered(name: impl Into<String>, prefix: impl Into<String>) -> Self {
        let display_name = name.into();
        let resolved = path::resolve(&display_name);
        TextSink {
            display_name,
            prefix: prefix.into(),
            has_been_used: false,
            kind: SinkKind::Buffered {
                path: resolved,
                accumulated: String::new(),
            },
        }
    }

    /// ストリーミング型シンクを作成
    pub fn streaming(
        display_name: impl Into<String>,
        prefix: impl Into<String>,
        target: StreamTarget,
    ) -> Self {
        TextSink {
            display_name: display_name.into(),
            prefix: prefix.into(),
            has_been_used: false,
            kind: SinkKind::Streaming { target },
        }
    }

    /// 呼び出し元が与えた表示名
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// 全書き込みに付く固定プレフィクス
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// 一度でも書き込まれたか
    pub fn has_been_used(&self) -> bool {
        self.has_been_used
    }

    /// ストリーミング構成かどうか
    pub fn is_streaming(&self) -> bool {
        matches!(self.kind, SinkKind::Streaming { .. })
    }

    /// 確定先の解決済みパス（ストリーミング構成ではNone）
    pub fn location(&self) -> Option<&Path> {
        match &self.kind {
            SinkKind::Buffered { path, .. } => Some(path),
            SinkKind::Streaming { .. } => None,
        }
    }

    /// 蓄積済みの出力（ストリーミング構成では常に空）
    pub fn accumulated_output(&self) -> &str {
        match &self.kind {
            SinkKind::Buffered { accumulated, .. } => accumulated,
            SinkKind::Streaming { .. } => "",
        }
    }

    /// 書き込みの基本操作
    ///
    /// 他のすべての書き込み操作はここを通る。渡されるテキストは
    /// 装飾適用済みで、ここではプレフィクスに関知しない
    fn base_write(&mut self, text: &str) -> Result<()> {
        self.has_been_used = true;
        match &mut self.kind {
            SinkKind::Buffered { accumulated, .. } => {
                accumulated.push_str(text);
                Ok(())
            }
            SinkKind::Streaming { target } => target.write_all(text).map_err(|e| {
                LineIoError::write(format!("{}: {}", self.display_name, e))
            }),
        }
    }

    /// プレフィクスを付けて書き込む
    pub fn write(&mut self, message: &str) -> Result<()> {
        let decorated = format!("{}{}", self.prefix, message);
        self.base_write(&decorated)
    }

    /// プレフィクスと改行を付けて書き込む
    pub fn writeln(&mut self, message: &str) -> Result<()> {
        self.write(&format!("{}\n", message))
    }

    /// 行番号付きで書き込む
    ///
    /// 0始まりの行インデックスを1始まりの表示行番号へ変換する。
    /// 負の入力は特別扱いせずそのまま算術的に伝わる
    pub fn writeln_at(&mut self, line_index: i64, message: &str) -> Result<()> {
        self.writeln(&format!("at line {}, {}", line_index + 1, message))
    }

    /// 蓄積内容をターゲットへアトミックに確定する
    ///
    /// ストリーミング構成では何もしない。複数回呼んでも安全
    /// （同じ内容を再度書き出す）
    pub fn finalize(&self) -> Result<()> {
        match &self.kind {
            SinkKind::Streaming { .. } => Ok(()),
            SinkKind::Buffered { path, accumulated } => {
                if path.exists() && !test_writable(path) {
                    return Err(LineIoError::write(format!(
                        "{}: target is not writable",
                        self.display_name
                    )));
                }
                atomic_write(path, accumulated).map_err(|e| {
                    LineIoError::write(format!("{}: {}", self.display_name, e))
                })
            }
        }
    }

    /// 退避先経由の安全書き込み
    ///
    /// 先にスクラッチ領域の一時ファイルへ書き出し、成功した場合のみ
    /// ターゲットを置換する。置換の間は直前の内容を
    /// `<表示名>.backup` として保持する
    pub fn safe_write(&self) -> Result<()> {
        let (path, accumulated) = match &self.kind {
            SinkKind::Streaming { .. } => {
                return Err(LineIoError::write(format!(
                    "{}: safe writing is not available for stream sinks",
                    self.display_name
                )));
            }
            SinkKind::Buffered { path, accumulated } => (path, accumulated),
        };

        // 1. スクラッチ領域へ退避書き込み
        let temp_path = scratch_path(&self.display_name);
        fs::write(&temp_path, accumulated).map_err(|e| {
            LineIoError::write(format!(
                "{}: could not stage output to {}: {}; the original file is untouched",
                self.display_name,
                temp_path.display(),
                e
            ))
        })?;

        // 2. ターゲットの書き込み可否を置換前に確認
        if path.exists() && !test_writable(path) {
            log::warn!(
                "safe_write left staged output behind at {}",
                temp_path.display()
            );
            return Err(LineIoError::write(format!(
                "{}: target is not writable; output preserved at {}",
                self.display_name,
                temp_path.display()
            )));
        }

        // 3. 直前の内容をバックアップへ退避
        let backup_name = format!("{}.backup", path::display_basename(&self.display_name));
        let backup_path = path.with_file_name(&backup_name);
        let had_previous = path.exists();
        if had_previous {
            fs::rename(path, &backup_path).map_err(|e| {
                log::warn!(
                    "safe_write left staged output behind at {}",
                    temp_path.display()
                );
                LineIoError::write(format!(
                    "{}: could not set aside previous contents as {}: {}; output preserved at {}",
                    self.display_name,
                    backup_name,
                    e,
                    temp_path.display()
                ))
            })?;
        }

        // 4. 一時ファイルでターゲットを置換
        let landed = move_into_place(&temp_path, path).map_err(|e| {
            log::warn!(
                "safe_write left staged output behind at {}",
                temp_path.display()
            );
            LineIoError::write(format!(
                "{}: could not replace target: {}; output preserved at {}",
                self.display_name,
                e,
                temp_path.display()
            ))
        })?;

        // 5. 置換結果が期待位置と一致するか確認
        let expected = path.canonicalize().map_err(|e| {
            LineIoError::write(format!("{}: {}", self.display_name, e))
        })?;
        if landed != expected {
            return Err(LineIoError::write(format!(
                "{}: replace landed at {} instead of {}",
                self.display_name,
                landed.display(),
                expected.display()
            )));
        }

        // 置換が完了したのでバックアップを引き上げる
        if had_previous {
            if let Err(e) = fs::remove_file(&backup_path) {
                log::warn!("could not remove backup {}: {}", backup_path.display(), e);
            }
        }

        Ok(())
    }
}

/// 書き込み権限テスト
fn test_writable(path: &Path) -> bool {
    fs::OpenOptions::new()
        .write(true)
        .append(true)
        .open(path)
        .is_ok()
}

/// アトミック書き込み（ターゲット隣の一時ファイル経由）
fn atomic_write(path: &Path, content: &str) -> io::Result<()> {
    let temp_path = sibling_temp_path(path)?;

    fs::write(&temp_path, content.as_bytes())?;
    fs::rename(&temp_path, path).map_err(|e| {
        // 一時ファイル削除を試行
        let _ = fs::remove_file(&temp_path);
        e
    })?;

    Ok(())
}

/// ターゲットと同じディレクトリに一意な一時ファイル名を生成
fn sibling_temp_path(original: &Path) -> io::Result<PathBuf> {
    let parent = original.parent().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "target has no parent directory")
    })?;
    let filename = original.file_name().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "target has no file name")
    })?;

    let temp_name = format!(".{}_{}", filename.to_string_lossy(), std::process::id());
    Ok(parent.join(temp_name))
}

/// スクラッチ領域の一時ファイル名を生成
fn scratch_path(display_name: &str) -> PathBuf {
    let temp_name = format!(
        ".{}_{}",
        path::display_basename(display_name),
        std::process::id()
    );
    std::env::temp_dir().join(temp_name)
}

/// 一時ファイルをターゲット位置へ移す
///
/// 同一ファイルシステムなら rename、失敗時はコピーにフォールバック
/// （スクラッチ領域は別ファイルシステムのことがある）。
/// 実際に落ち着いた位置を正規化して返す
fn move_into_place(temp: &Path, target: &Path) -> io::Result<PathBuf> {
    if fs::rename(temp, target).is_err() {
        fs::copy(temp, target)?;
        fs::remove_file(temp)?;
    }
    target.canonicalize()
}
