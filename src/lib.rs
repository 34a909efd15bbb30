//! lineio - 行指向テキストファイルI/Oユーティリティ
//!
//! コマンドラインプログラム向けの入出力の便宜：ファイル全体の読み込み、
//! 改行コードの推定と行分割、蓄積した出力のアトミック確定・安全書き込み、
//! および終了時一括確定のためのシンク登録簿

// コアモジュール
pub mod error;
pub mod path;

// 読み込み層
pub mod source;

// 書き込み層
pub mod registry;
pub mod sink;

// 公開API
pub use error::{ErrorKind, LineIoError, Result};
pub use path::{resolve, DefaultPathResolver, PathResolver};
pub use registry::{SinkId, SinkRegistry};
pub use sink::{StreamTarget, TextSink};
pub use source::{LineEnding, SourceLocation, TextSource};
