//! # wordlattice
//!
//! 音声デコーダのための単語ラティスと、HTK Standard Lattice Format (SLF) の
//! 読み書きを提供するライブラリです。
//!
//! ## 概要
//!
//! ラティスは、発話に対する単語仮説の空間を表す有向重み付きグラフです。
//! ノードは (開始フレーム, 言語モデル状態) の組で識別され、リンクは単語と
//! 対数領域の音響スコアを持ちます。
//!
//! ## 主な機能
//!
//! - **インデックスで安定したグラフ格納**: ノードとリンクは追記のみで、インデックスは変わりません
//! - **ノードの重複排除**: (開始フレーム, 言語モデル状態) によるノードの正規化
//! - **単語の解決**: 発音バリアント接尾辞の付与と、必要に応じた辞書の拡張
//! - **SLFの読み込み**: 不完全な入力に寛容な2状態パーサー
//! - **SLF/DOTの書き出し**: SLFへの逆変換と、Graphvizによる可視化
//!
//! ## 使用例
//!
//! ```
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use std::sync::Arc;
//! use wordlattice::{Lattice, LogMath};
//!
//! let slf = "start=0
//! end=2
//! N=3=2
//! I=0 t=0.0 W=<s>
//! I=1 t=1.0 W=HELLO
//! I=2 t=2.0 W=</s>
//! J=0 S=0 E=1 W=HELLO a=-50.0
//! J=1 S=1 E=2 W=</s> a=-10.0";
//!
//! let mut lattice = Lattice::new(Arc::new(LogMath::default()), None);
//! lattice.read_htk(slf.as_bytes(), 100)?;
//!
//! assert_eq!(lattice.num_nodes(), 3);
//! assert_eq!(lattice.num_links(), 2);
//! assert_eq!(lattice.start_idx(), Some(0));
//! assert_eq!(lattice.end_idx(), Some(2));
//!
//! let node = lattice.node(1).unwrap();
//! assert_eq!(node.sf(), 100);
//! assert_eq!(node.entries().len(), 1);
//! assert_eq!(node.exits().len(), 1);
//!
//! let mut out = vec![];
//! lattice.write_htk(&mut out, 100)?;
//! # Ok(())
//! # }
//! ```

#[cfg(not(any(target_pointer_width = "32", target_pointer_width = "64")))]
compile_error!("`target_pointer_width` must be 32 or 64");

/// SLFの読み書き設定
pub mod config;

/// 発音辞書
pub mod dictionary;

/// エラー型の定義
pub mod errors;

/// 単語ラティス
pub mod lattice;

/// 対数領域の数値変換
pub mod logmath;

/// SLFとDOTの読み書き
pub mod slf;

/// ユーティリティ関数
pub mod utils;


// Re-exports
pub use config::SlfConfig;
pub use dictionary::{Dictionary, WordId};
pub use lattice::{Lattice, Link, Node, NodeId};
pub use logmath::LogMath;

/// このライブラリのバージョン番号
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
