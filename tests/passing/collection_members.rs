use serde::{Deserialize, Serialize};
use sheetbake::{Record, Stack};
use std::collections::{BTreeSet, HashMap, VecDeque};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Record)]
#[record(mutable, naming = "snake_case")]
pub struct Loadout {
    #[data]
    slots: [u8; 3],
    #[data]
    tags: BTreeSet<String>,
    #[data]
    weights: HashMap<String, f32>,
    #[data]
    queue: VecDeque<u32>,
    #[data]
    undo: Stack<u32>,
    #[data]
    nickname: Option<String>,
    cache: Vec<u8>,
}

fn main() {
    let mut loadout = Loadout::default();
    loadout.set_tags(vec!["fast".to_string()]);
    loadout.set_weights(vec![("sword".to_string(), 2.0)]);
    loadout.set_queue([1, 2, 3]);
    assert_eq!(loadout.tags().len(), 1);
    assert_eq!(loadout.queue().len(), 3);
    assert!(loadout.nickname().is_none());
}
