use anyhow::{bail, ensure, Context, Result};
use serde::{de::DeserializeOwned, Deserialize};
use std::{fmt, fs, path::Path};

use crate::features::{FeatureVector, N_FEATURES};
use crate::types::ClusterInput;

const CLUSTER_DIM: usize = 3;

fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let txt = fs::read_to_string(path)
        .with_context(|| format!("failed to read {} at {}", what, path.display()))?;
    serde_json::from_str(&txt).with_context(|| format!("failed to parse {} JSON", what))
}

// ---------- Carbon-intensity regressor ----------

/// How per-tree outputs are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    /// Random-forest style average.
    #[default]
    Mean,
    /// Boosting style sum; leaf values already carry the learning rate.
    Sum,
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Aggregation::Mean => f.write_str("mean"),
            Aggregation::Sum => f.write_str("sum"),
        }
    }
}

/// One regression tree in flat array form: node `i` is a leaf when
/// `children_left[i] == -1`, otherwise go left iff `x[feature[i]] <= threshold[i]`.
#[derive(Debug, Clone, Deserialize)]
pub struct Tree {
    children_left: Vec<i64>,
    children_right: Vec<i64>,
    feature: Vec<i64>,
    threshold: Vec<f64>,
    value: Vec<f64>,
}

impl Tree {
    fn validate(&self, idx: usize) -> Result<()> {
        let n = self.value.len();
        ensure!(n > 0, "tree {idx}: no nodes");
        ensure!(
            self.children_left.len() == n
                && self.children_right.len() == n
                && self.feature.len() == n
                && self.threshold.len() == n,
            "tree {idx}: node arrays differ in length"
        );

        for node in 0..n {
            let (left, right) = (self.children_left[node], self.children_right[node]);
            if left < 0 {
                ensure!(right < 0, "tree {idx}: node {node} has only a right child");
                continue;
            }
            // Children always sit after their parent, so traversal terminates.
            for child in [left, right] {
                ensure!(
                    child > node as i64 && (child as usize) < n,
                    "tree {idx}: node {node} points to invalid child {child}"
                );
            }
            let f = self.feature[node];
            ensure!(
                (0..N_FEATURES as i64).contains(&f),
                "tree {idx}: node {node} splits on unknown feature {f}"
            );
        }
        Ok(())
    }

    fn predict(&self, x: &[f64]) -> f64 {
        let mut node = 0;
        loop {
            let left = self.children_left[node];
            if left < 0 {
                return self.value[node];
            }
            let f = self.feature[node] as usize;
            node = if x[f] <= self.threshold[node] {
                left as usize
            } else {
                self.children_right[node] as usize
            };
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Regressor {
    Linear {
        coefficients: Vec<f64>,
        intercept: f64,
    },
    TreeEnsemble {
        trees: Vec<Tree>,
        #[serde(default)]
        aggregation: Aggregation,
        #[serde(default)]
        base_score: f64,
    },
}

impl Regressor {
    fn validate(&self) -> Result<()> {
        match self {
            Regressor::Linear { coefficients, .. } => {
                if coefficients.len() != N_FEATURES {
                    bail!(
                        "linear regressor has {} coefficients, expected {}",
                        coefficients.len(),
                        N_FEATURES
                    );
                }
            }
            Regressor::TreeEnsemble { trees, .. } => {
                ensure!(!trees.is_empty(), "tree ensemble has no trees");
                for (i, tree) in trees.iter().enumerate() {
                    tree.validate(i)?;
                }
            }
        }
        Ok(())
    }
}

/// Carbon-intensity regressor over the 11-feature vector.
pub struct CarbonModel {
    regressor: Regressor,
}

impl CarbonModel {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let regressor: Regressor = read_json(path.as_ref(), "carbon model")?;
        Self::new(regressor).context("invalid carbon model")
    }

    pub fn new(regressor: Regressor) -> Result<Self> {
        regressor.validate()?;
        Ok(Self { regressor })
    }

    pub fn predict(&self, features: &FeatureVector) -> f64 {
        let x = features.as_slice();
        match &self.regressor {
            Regressor::Linear {
                coefficients,
                intercept,
            } => intercept + coefficients.iter().zip(x).map(|(w, v)| w * v).sum::<f64>(),
            Regressor::TreeEnsemble {
                trees,
                aggregation,
                base_score,
            } => {
                let total: f64 = trees.iter().map(|t| t.predict(x)).sum();
                match aggregation {
                    Aggregation::Mean => base_score + total / trees.len() as f64,
                    Aggregation::Sum => base_score + total,
                }
            }
        }
    }

    pub fn describe(&self) -> String {
        match &self.regressor {
            Regressor::Linear { .. } => "linear".to_string(),
            Regressor::TreeEnsemble {
                trees, aggregation, ..
            } => format!("tree_ensemble({} trees, {})", trees.len(), aggregation),
        }
    }
}

// ---------- User-behaviour clusterer ----------

/// Pre-fit standardization: `(x - mean) / scale`.
#[derive(Debug, Clone, Deserialize)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Self {
        Self { mean, scale }
    }

    pub fn transform(&self, x: [f64; CLUSTER_DIM]) -> [f64; CLUSTER_DIM] {
        let mut out = x;
        for (i, v) in out.iter_mut().enumerate() {
            // constant training columns carry a zero scale
            let s = if self.scale[i] == 0.0 { 1.0 } else { self.scale[i] };
            *v = (*v - self.mean[i]) / s;
        }
        out
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct KMeans {
    cluster_centers: Vec<Vec<f64>>,
}

impl KMeans {
    pub fn new(cluster_centers: Vec<Vec<f64>>) -> Self {
        Self { cluster_centers }
    }

    pub fn n_clusters(&self) -> usize {
        self.cluster_centers.len()
    }

    /// Index of the nearest centroid; ties resolve to the lowest index.
    pub fn predict(&self, x: &[f64; CLUSTER_DIM]) -> usize {
        let mut best = 0;
        let mut best_d = f64::INFINITY;
        for (i, c) in self.cluster_centers.iter().enumerate() {
            let d: f64 = c.iter().zip(x).map(|(a, b)| (a - b) * (a - b)).sum();
            if d < best_d {
                best = i;
                best_d = d;
            }
        }
        best
    }
}

/// Scaler + k-means pair that labels a charging session.
pub struct UserClusterer {
    scaler: StandardScaler,
    kmeans: KMeans,
}

impl UserClusterer {
    pub fn load(model_path: impl AsRef<Path>, scaler_path: impl AsRef<Path>) -> Result<Self> {
        let kmeans: KMeans = read_json(model_path.as_ref(), "cluster model")?;
        let scaler: StandardScaler = read_json(scaler_path.as_ref(), "cluster scaler")?;
        Self::new(scaler, kmeans).context("invalid cluster model")
    }

    pub fn new(scaler: StandardScaler, kmeans: KMeans) -> Result<Self> {
        ensure!(
            scaler.mean.len() == CLUSTER_DIM && scaler.scale.len() == CLUSTER_DIM,
            "scaler must have {} means and scales, got {} and {}",
            CLUSTER_DIM,
            scaler.mean.len(),
            scaler.scale.len()
        );
        ensure!(kmeans.n_clusters() > 0, "k-means model has no centroids");
        for (i, c) in kmeans.cluster_centers.iter().enumerate() {
            ensure!(
                c.len() == CLUSTER_DIM,
                "centroid {} has {} dimensions, expected {}",
                i,
                c.len(),
                CLUSTER_DIM
            );
        }
        Ok(Self { scaler, kmeans })
    }

    pub fn n_clusters(&self) -> usize {
        self.kmeans.n_clusters()
    }

    pub fn assign(&self, input: &ClusterInput) -> usize {
        let scaled = self.scaler.transform(input.to_array());
        self.kmeans.predict(&scaled)
    }
}
