use serde::{Deserialize, Serialize};
use sheetbake::{AssetRef, PropertyNode, Record, SheetRef};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Record)]
pub struct Reward {
    #[data]
    gold: u32,
    #[data]
    item: SheetRef<Item>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Record)]
#[record(table)]
pub struct Item {
    #[data(id)]
    id: String,
    #[data]
    icon: AssetRef,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Record)]
#[record(table)]
pub struct Quest {
    #[data(id)]
    id: u32,
    #[data(vertical)]
    rewards: Vec<Reward>,
    #[data]
    prerequisites: Vec<SheetRef<Quest>>,
}

fn main() {
    let quest = Quest { id: 1, rewards: vec![Reward { gold: 10, item: SheetRef::new("sword") }], prerequisites: Vec::new() };
    let root = PropertyNode::<Quest>::build();
    let paths: Vec<&str> = root.traverse_leaf(&quest).map(|(node, _)| node.path()).collect();
    assert_eq!(paths, ["Id", "Rewards.Gold", "Rewards.Item", "Prerequisites"]);
}
