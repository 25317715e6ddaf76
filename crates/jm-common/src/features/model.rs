use serde::Deserialize;

/// Frozen gradient-boosted tree ensemble, exported at training time as a JSON
/// dump of per-tree node arrays. Evaluation is a plain tree walk; nothing
/// here learns.
#[derive(Debug, Clone, Deserialize)]
pub struct GradientBoostedModel {
    pub base_score: f64,
    /// True when the model was fit against a log1p-transformed target; the
    /// caller must invert with exp_m1 after prediction.
    #[serde(default)]
    pub log_target: bool,
    pub trees: Vec<Tree>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Tree {
    pub nodes: Vec<TreeNode>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

impl Tree {
    /// Walk from the root to a leaf. Out-of-range feature or child indices
    /// yield None rather than panicking; the ensemble surfaces that as a
    /// typed prediction failure.
    fn evaluate(&self, features: &[f64]) -> Option<f64> {
        let mut index = 0usize;

        // Node count bounds the walk, so a malformed cyclic dump terminates.
        for _ in 0..=self.nodes.len() {
            match self.nodes.get(index)? {
                TreeNode::Leaf { value } => return Some(*value),
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let value = features.get(*feature)?;
                    index = if *value < *threshold { *left } else { *right };
                }
            }
        }

        None
    }
}

impl GradientBoostedModel {
    /// Number of input features the ensemble references (highest split
    /// feature index + 1). Used for artifact integrity checks.
    pub fn max_feature_index(&self) -> Option<usize> {
        self.trees
            .iter()
            .flat_map(|tree| &tree.nodes)
            .filter_map(|node| match node {
                TreeNode::Split { feature, .. } => Some(*feature),
                TreeNode::Leaf { .. } => None,
            })
            .max()
    }

    /// Sum of base score and every tree's leaf value for the row. None when
    /// any tree walk falls off the node array.
    pub fn predict(&self, features: &[f64]) -> Option<f64> {
        let mut total = self.base_score;
        for tree in &self.trees {
            total += tree.evaluate(features)?;
        }
        Some(total)
    }
}
