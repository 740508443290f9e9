use std::collections::HashMap;

use bimap::BiHashMap;

use crate::rules::{AccessRules, Conditions};

pub trait AccessMesadata: AccessRules {
    fn bename_layer(&mut self, layer: i32, layername: String);
    fn layer_layername(&self, layer: i32) -> Option<&str>;
    fn layername_layer(&self, layername: &str) -> Option<i32>;

    fn bename_net(&mut self, net: usize, netname: String);
    fn net_netname(&self, net: usize) -> Option<&str>;
    fn netname_net(&self, netname: &str) -> Option<usize>;

    /// Vertical distance between two copper layers.
    fn stackup_height(&self, layer1: i32, layer2: i32) -> i64;
}

/// Plain in-memory board metadata.
#[derive(Debug, Clone, Default)]
pub struct BoardMesadata {
    layer_layername: BiHashMap<i32, String>,
    net_netname: BiHashMap<usize, String>,
    default_clearance: i64,
    net_clearances: HashMap<usize, i64>,
    // Dielectric thickness between layer `i` and layer `i + 1`.
    layer_gaps: Vec<i64>,
}

impl BoardMesadata {
    pub fn new(default_clearance: i64) -> Self {
        Self {
            default_clearance,
            ..Default::default()
        }
    }

    pub fn set_net_clearance(&mut self, net: usize, clearance: i64) {
        self.net_clearances.insert(net, clearance);
    }

    pub fn set_layer_gap(&mut self, layer: i32, thickness: i64) {
        let layer = layer.max(0) as usize;

        if self.layer_gaps.len() <= layer {
            self.layer_gaps.resize(layer + 1, 0);
        }

        self.layer_gaps[layer] = thickness;
    }

    fn net_clearance(&self, maybe_net: Option<usize>) -> i64 {
        maybe_net
            .and_then(|net| self.net_clearances.get(&net).copied())
            .unwrap_or(self.default_clearance)
    }
}

impl AccessRules for BoardMesadata {
    fn clearance(&self, conditions1: &Conditions, conditions2: &Conditions) -> i64 {
        self.net_clearance(conditions1.maybe_net)
            .max(self.net_clearance(conditions2.maybe_net))
    }

    fn largest_clearance(&self, _net: Option<usize>) -> i64 {
        self.net_clearances
            .values()
            .copied()
            .fold(self.default_clearance, i64::max)
    }
}

impl AccessMesadata for BoardMesadata {
    fn bename_layer(&mut self, layer: i32, layername: String) {
        self.layer_layername.insert(layer, layername);
    }

    fn layer_layername(&self, layer: i32) -> Option<&str> {
        self.layer_layername.get_by_left(&layer).map(|s| s.as_str())
    }

    fn layername_layer(&self, layername: &str) -> Option<i32> {
        self.layer_layername.get_by_right(layername).copied()
    }

    fn bename_net(&mut self, net: usize, netname: String) {
        self.net_netname.insert(net, netname);
    }

    fn net_netname(&self, net: usize) -> Option<&str> {
        self.net_netname.get_by_left(&net).map(|s| s.as_str())
    }

    fn netname_net(&self, netname: &str) -> Option<usize> {
        self.net_netname.get_by_right(netname).copied()
    }

    fn stackup_height(&self, layer1: i32, layer2: i32) -> i64 {
        let (top, bottom) = (layer1.min(layer2).max(0), layer1.max(layer2).max(0));

        (top..bottom)
            .map(|layer| self.layer_gaps.get(layer as usize).copied().unwrap_or(0))
            .sum()
    }
}
