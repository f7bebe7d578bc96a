//! ユーティリティ関数を提供するモジュール
//!
//! SLFの`key=value`フィールド分割と、発音バリアント付き単語の表記処理を含みます。

use std::sync::LazyLock;

use regex::Regex;

static ALT_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+)\(([0-9]+)\)$").unwrap());

/// `key=value`形式のフィールドをキーと値に分割する
///
/// 最初の`=`で分割します。`=`を含まない場合は`None`を返します。
///
/// # 例
///
/// ```
/// # use wordlattice::utils::split_field;
/// assert_eq!(split_field("W=HELLO"), Some(("W", "HELLO")));
/// assert_eq!(split_field("N=3=2"), Some(("N", "3=2")));
/// assert_eq!(split_field("HELLO"), None);
/// ```
#[inline]
pub fn split_field(field: &str) -> Option<(&str, &str)> {
    field.split_once('=')
}

/// 発音バリアント付きの語彙素を作成する
///
/// # 例
///
/// ```
/// # use wordlattice::utils::alt_lexeme;
/// assert_eq!(alt_lexeme("THE", 2), "THE(2)");
/// ```
pub fn alt_lexeme(word: &str, alt: u32) -> String {
    format!("{word}({alt})")
}

/// 語彙素を基本表記と発音バリアント番号に分割する
///
/// 接尾辞`(n)`を持たない場合、バリアント番号は1になります。
///
/// # 例
///
/// ```
/// # use wordlattice::utils::split_alt;
/// assert_eq!(split_alt("THE(2)"), ("THE", 2));
/// assert_eq!(split_alt("THE"), ("THE", 1));
/// assert_eq!(split_alt("(2)"), ("(2)", 1));
/// ```
pub fn split_alt(lexeme: &str) -> (&str, u32) {
    if let Some(cap) = ALT_SUFFIX_RE.captures(lexeme)
        && let Ok(alt) = cap[2].parse::<u32>()
    {
        let base = cap.get(1).map_or(lexeme, |m| m.as_str());
        return (base, alt);
    }
    (lexeme, 1)
}

#[cfg(test)]
/// HashMapリテラルを簡潔に記述するためのマクロ
///
/// このマクロはテスト時のみ利用可能です。
macro_rules! hashmap {
    ( $($k:expr => $v:expr,)* ) => {
        {
            #[allow(unused_mut)]
            let mut h = hashbrown::HashMap::new();
            $(
                h.insert($k, $v);
            )*
            h
        }
    };
    ( $($k:expr => $v:expr),* ) => {
        hashmap![$( $k => $v, )*]
    };
}

#[cfg(test)]
pub(crate) use hashmap;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_alt_nested_parens() {
        assert_eq!(split_alt("A(B)(3)"), ("A(B)", 3));
        assert_eq!(split_alt("A(B)"), ("A(B)", 1));
    }

    #[test]
    fn test_split_field_empty_value() {
        assert_eq!(split_field("W="), Some(("W", "")));
    }
}
