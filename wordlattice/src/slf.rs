//! HTK Standard Lattice Format (SLF) の読み書き
//!
//! SLFは行指向のテキスト形式です。`key=value`形式のヘッダ宣言が
//! `N=<ノード数> L=<リンク数>`の行で終わり、その後にノード行（`I=`）と
//! アーク行（`J=`）が続きます。`#`で始まる行と空行は無視されます。
//!
//! ```text
//! VERSION=1.0
//! start=0
//! end=2
//! N=3    L=2
//! I=0    t=0.00    W=<s>
//! I=1    t=1.00    W=HELLO
//! I=2    t=2.00    W=</s>
//! J=0    S=0    E=1    W=HELLO    a=-50.0
//! J=1    S=1    E=2    W=</s>     a=-10.0
//! ```
//!
//! 読み込みは[`Lattice::read_htk`](crate::Lattice::read_htk)、書き出しは
//! [`Lattice::write_htk`](crate::Lattice::write_htk)と
//! [`Lattice::write_dot`](crate::Lattice::write_dot)で行います。
mod dot;
pub(crate) mod reader;
mod writer;

use std::path::Path;

pub use crate::dictionary::NULL_WORD;

pub(crate) fn is_zstd_path(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "zst")
}
