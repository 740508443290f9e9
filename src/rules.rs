#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Conditions {
    pub maybe_net: Option<usize>,
    pub maybe_layer: Option<i32>,
}

pub trait AccessRules {
    fn clearance(&self, conditions1: &Conditions, conditions2: &Conditions) -> i64;
    fn largest_clearance(&self, net: Option<usize>) -> i64;
}
