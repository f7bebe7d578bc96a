//! ノードの重複排除マップ
//!
//! (開始フレーム, 言語モデル状態) の組からノードのインデックスへの対応を保持します。
use hashbrown::HashMap;

use crate::dictionary::WordId;
use crate::lattice::node::NodeId;

/// ノード識別子からノードインデックスへのマップ
#[derive(Debug, Default, Clone)]
pub struct NodeMap {
    map: HashMap<NodeId, usize>,
}

impl NodeMap {
    /// 空のマップを作成します。
    pub fn new() -> Self {
        Self::default()
    }

    /// 対応を登録します。
    ///
    /// 同じ識別子が既に登録されている場合は上書きし、以前のインデックスを返します。
    /// 以前のノードの隣接リストは統合されません。
    pub fn add(&mut self, sf: u32, lm_state: WordId, idx: usize) -> Option<usize> {
        let prev = self.map.insert(NodeId::new(sf, lm_state), idx);
        if let Some(prev) = prev
            && prev != idx
        {
            log::debug!(
                "Node ({sf}, {}) remapped from {prev} to {idx}",
                lm_state.get()
            );
        }
        prev
    }

    /// 識別子が`idx`を指している場合に限り、その対応を削除します。
    ///
    /// 後から同じ識別子で登録された別のノードの対応は残ります。
    pub fn remove_if_eq(&mut self, sf: u32, lm_state: WordId, idx: usize) -> bool {
        let id = NodeId::new(sf, lm_state);
        if self.map.get(&id) == Some(&idx) {
            self.map.remove(&id);
            true
        } else {
            false
        }
    }

    /// 識別子に対応するノードインデックスを検索します。
    #[inline]
    pub fn get(&self, sf: u32, lm_state: WordId) -> Option<usize> {
        self.map.get(&NodeId::new(sf, lm_state)).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::utils::hashmap;

    #[test]
    fn test_last_write_wins() {
        let mut map = NodeMap::new();
        let w = WordId::new(3);
        assert_eq!(map.add(10, w, 0), None);
        assert_eq!(map.add(10, w, 5), Some(0));
        assert_eq!(map.get(10, w), Some(5));
        assert_eq!(map.add(10, w, 5), Some(5));
    }

    #[test]
    fn test_remove_if_eq() {
        let mut map = NodeMap::new();
        let w = WordId::new(3);
        map.add(10, w, 0);
        map.add(10, w, 4);
        assert!(!map.remove_if_eq(10, w, 0));
        assert_eq!(map.get(10, w), Some(4));
        assert!(map.remove_if_eq(10, w, 4));
        assert_eq!(map.get(10, w), None);
        assert!(!map.remove_if_eq(10, w, 4));
    }

    #[test]
    fn test_keys_are_composite() {
        let mut map = NodeMap::new();
        let expected = hashmap! {
            (0, 1) => 0,
            (0, 2) => 1,
            (7, 1) => 2,
        };
        for (&(sf, w), &idx) in &expected {
            map.add(sf, WordId::new(w), idx);
        }
        for (&(sf, w), &idx) in &expected {
            assert_eq!(map.get(sf, WordId::new(w)), Some(idx));
        }
        assert_eq!(map.get(7, WordId::new(2)), None);
    }
}
