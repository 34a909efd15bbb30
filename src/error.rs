//! エラーハンドリングシステム
//!
//! lineio 全体で使用される統一されたエラー型とユーティリティを定義。
//! 失敗は読み込み系と書き込み系の二種類のみ：下位のシステムエラーは
//! 発生箇所で捕捉し、表示名と元の失敗内容を埋め込んで再ラップする

use thiserror::Error;

/// クレート全体のエラー型
///
/// どの操作も失敗は一度きりで即座に呼び出し元へ伝播する（自動リトライなし）
#[derive(Error, Debug, Clone)]
pub enum LineIoError {
    /// 読み込み失敗（存在しないファイル、権限不足、UTF-8復号失敗など）
    #[error("read failed: {message}")]
    FailedRead { message: String },

    /// 書き込み失敗（書き込み不可ターゲット、一時ファイル退避失敗など）
    #[error("write failed: {message}")]
    FailedWrite { message: String },
}

/// エラー種別
///
/// メッセージ本文を無視した種別のみの比較に使う。
/// 壊れやすいシステム由来メッセージの照合には `message_contains` を使うこと
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Read,
    Write,
}

impl LineIoError {
    /// 読み込みエラーを生成
    pub fn read(message: impl Into<String>) -> Self {
        LineIoError::FailedRead { message: message.into() }
    }

    /// 書き込みエラーを生成
    pub fn write(message: impl Into<String>) -> Self {
        LineIoError::FailedWrite { message: message.into() }
    }

    /// エラー種別を取得
    pub fn kind(&self) -> ErrorKind {
        match self {
            LineIoError::FailedRead { .. } => ErrorKind::Read,
            LineIoError::FailedWrite { .. } => ErrorKind::Write,
        }
    }

    /// 埋め込まれたメッセージ本文
    pub fn message(&self) -> &str {
        match self {
            LineIoError::FailedRead { message } => message,
            LineIoError::FailedWrite { message } => message,
        }
    }

    /// メッセージに部分文字列が含まれるか
    pub fn message_contains(&self, needle: &str) -> bool {
        self.message().contains(needle)
    }
}

/// プロジェクト標準のResult型
pub type Result<T> = std::result::Result<T, LineIoError>;
