//! パス解決ユーティリティ
//!
//! 利用者が与えたファイル名（絶対、`~`始まり、相対）を絶対パスへ展開する。
//! ここでは検証しない：不正なパスの検出は解決時ではなくファイルアクセス時に行う

use std::env;
use std::path::{Path, PathBuf};

/// パス解決のトレイト
pub trait PathResolver {
    /// 名前を絶対パスへ展開
    fn resolve(name: &str) -> PathBuf;

    /// `~` 始まりの名前をホームディレクトリ基準で展開
    fn expand_tilde(name: &str) -> PathBuf;
}

/// パス解決の実装
pub struct DefaultPathResolver;

impl PathResolver for DefaultPathResolver {
    fn resolve(name: &str) -> PathBuf {
        if name.starts_with('/') {
            // 既に絶対パス
            PathBuf::from(name)
        } else if name.starts_with('~') {
            Self::expand_tilde(name)
        } else {
            // カレントディレクトリ相対
            env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join(name)
        }
    }

    fn expand_tilde(name: &str) -> PathBuf {
        if name == "~" || name.starts_with("~/") {
            return PathBuf::from(shellexpand::tilde(name).into_owned());
        }

        // `~user` 形式：現在のホームディレクトリの兄弟として解決する。
        // ホームが特定できない場合は字面のまま返す
        let rest = &name[1..];
        let (user, remainder) = match rest.find('/') {
            Some(idx) => (&rest[..idx], &rest[idx + 1..]),
            None => (rest, ""),
        };

        match dirs::home_dir().and_then(|home| home.parent().map(|p| p.join(user))) {
            Some(user_home) => {
                if remainder.is_empty() {
                    user_home
                } else {
                    user_home.join(remainder)
                }
            }
            None => PathBuf::from(name),
        }
    }
}

/// パス解決の便利関数
pub fn resolve<S: AsRef<str>>(name: S) -> PathBuf {
    DefaultPathResolver::resolve(name.as_ref())
}

/// 表示名の末尾要素（バックアップファイル名などに使う）
pub fn display_basename(name: &str) -> &str {
    Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_name_is_identity() {
        assert_eq!(resolve("/var/log/messages"), PathBuf::from("/var/log/messages"));
        assert_eq!(resolve("/"), PathBuf::from("/"));
    }

    #[test]
    fn test_relative_name_joins_cwd() {
        let cwd = env::current_dir().unwrap();
        assert_eq!(resolve("notes.txt"), cwd.join("notes.txt"));
        assert_eq!(resolve("a/b/c.txt"), cwd.join("a/b/c.txt"));
    }

    #[test]
    fn test_expand_home() {
        // テスト環境でのホームディレクトリ設定
        env::set_var("HOME", "/home/testuser");

        assert_eq!(
            resolve("~/documents/file.txt"),
            PathBuf::from("/home/testuser/documents/file.txt")
        );
        assert_eq!(resolve("~"), PathBuf::from("/home/testuser"));
    }

    #[test]
    fn test_expand_named_user() {
        env::set_var("HOME", "/home/testuser");

        assert_eq!(
            resolve("~alice/projects/readme.md"),
            PathBuf::from("/home/alice/projects/readme.md")
        );
        assert_eq!(resolve("~alice"), PathBuf::from("/home/alice"));
    }

    #[test]
    fn test_display_basename() {
        assert_eq!(display_basename("out.txt"), "out.txt");
        assert_eq!(display_basename("logs/out.txt"), "out.txt");
        assert_eq!(display_basename("~/out.txt"), "out.txt");
    }
}
