//! シンク登録簿
//!
//! 生成されたすべてのシンクを登録順に保持し、プログラム終了時の
//! 一括確定を可能にする。グローバルではなく呼び出し元が所有する
//! 明示的な値として構築し、シンク生成時に渡す

use crate::error::{LineIoError, Result};
use crate::sink::{StreamTarget, TextSink};

/// 登録識別子
///
/// 同一性は内容ではなくこのIDで判定する。再登録のたびに新しいIDが振られる
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SinkId(u64);

struct RegisteredSink {
    id: SinkId,
    sink: TextSink,
}

/// シンク登録簿
///
/// 追記のみの順序付きリスト（明示的な削除を除く）。
/// 各シンクは構築時にちょうど一度登録される
#[derive(Default)]
pub struct SinkRegistry {
    sinks: Vec<RegisteredSink>,
    next_id: u64,
}

impl SinkRegistry {
    pub fn new() -> Self {
        Self {
            sinks: Vec::new(),
            next_id: 0,
        }
    }

    /// ディスク確定型シンクを作成して登録する
    pub fn open_file(&mut self, name: impl Into<String>, prefix: impl Into<String>) -> SinkId {
        self.register(TextSink::buffered(name, prefix))
    }

    /// ストリーミング型シンクを作成して登録する
    pub fn open_stream(
        &mut self,
        display_name: impl Into<String>,
        prefix: impl Into<String>,
        target: StreamTarget,
    ) -> SinkId {
        self.register(TextSink::streaming(display_name, prefix, target))
    }

    /// シンクを登録簿の末尾に追加する
    ///
    /// 通常は open_* から呼ばれる。明示的に削除したシンクを
    /// 再登録する用途でも使える
    pub fn register(&mut self, sink: TextSink) -> SinkId {
        let id = SinkId(self.next_id);
        self.next_id += 1;
        self.sinks.push(RegisteredSink { id, sink });
        id
    }

    /// シンクを同一性（ID）で削除し、所有権を返す
    ///
    /// 未登録IDや二重削除は書き込みエラーとして報告する
    pub fn deregister(&mut self, id: SinkId) -> Result<TextSink> {
        match self.sinks.iter().position(|entry| entry.id == id) {
            Some(index) => Ok(self.sinks.remove(index).sink),
            None => Err(LineIoError::write(format!(
                "no registered sink with id {:?} (already removed?)",
                id
            ))),
        }
    }

    /// IDでシンクを参照
    pub fn get(&self, id: SinkId) -> Option<&TextSink> {
        self.sinks
            .iter()
            .find(|entry| entry.id == id)
            .map(|entry| &entry.sink)
    }

    /// IDでシンクを可変参照
    pub fn get_mut(&mut self, id: SinkId) -> Option<&mut TextSink> {
        self.sinks
            .iter_mut()
            .find(|entry| entry.id == id)
            .map(|entry| &mut entry.sink)
    }

    /// 登録中のシンク数
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// 登録中のシンクの表示名一覧
    pub fn display_names(&self) -> Vec<String> {
        self.sinks
            .iter()
            .map(|entry| entry.sink.display_name().to_string())
            .collect()
    }

    /// 登録順に全シンクを確定する
    ///
    /// 途中で失敗しても止まらず、全シンクを試した後に失敗があれば
    /// 集約した単一のエラーとして報告する
    pub fn finalize_all(&self) -> Result<()> {
        let mut failures: Vec<String> = Vec::new();

        for entry in &self.sinks {
            if let Err(e) = entry.sink.finalize() {
                failures.push(e.message().to_string());
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            log::warn!("{} of {} sinks failed to finalize", failures.len(), self.sinks.len());
            Err(LineIoError::write(format!(
                "{} of {} outputs could not be finalized:\n{}",
                failures.len(),
                self.sinks.len(),
                failures.join("\n")
            )))
        }
    }
}
