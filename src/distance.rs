//! Word-mover distance between two token lists.
//!
//! The distance is the minimum cumulative embedding-space movement needed to
//! transform one text's token distribution into the other's: each side's
//! in-vocabulary tokens form a normalized bag-of-words histogram, ground
//! costs are Euclidean distances between unit word vectors, and the optimal
//! transport plan is found exactly with a successive-shortest-path min-cost
//! flow over integer-scaled weights.
//!
//! Out-of-vocabulary tokens are dropped. If either side ends up empty the
//! distance is `+∞`, which callers map to the undefined bucket.

use fxhash::{FxHashMap, FxHashSet};

use crate::model::WordEmbeddings;

/// Lower-cases, splits on whitespace, and drops stop words. This is the only
/// tokenization the distance metric sees; negation detection works on the
/// raw text instead.
pub(crate) fn content_tokens(text: &str, stop_words: &FxHashSet<&'static str>) -> Vec<String> {
    text.to_lowercase()
        .split_whitespace()
        .filter(|token| !stop_words.contains(token))
        .map(str::to_owned)
        .collect()
}

pub(crate) fn word_mover_distance(
    first: &[String],
    second: &[String],
    embeddings: &WordEmbeddings,
) -> f64 {
    let left = vocab_histogram(first, embeddings);
    let right = vocab_histogram(second, embeddings);

    if left.is_empty() || right.is_empty() {
        return f64::INFINITY;
    }

    let left_total: u64 = left.iter().map(|entry| entry.count).sum();
    let right_total: u64 = right.iter().map(|entry| entry.count).sum();

    // Scale the nBOW weights (count / total) by left_total * right_total so
    // every supply and demand is integral and the flow solver is exact.
    let source = 0;
    let sink = left.len() + right.len() + 1;
    let mut network = FlowNetwork::new(sink + 1);

    for (i, entry) in left.iter().enumerate() {
        network.add_edge(source, 1 + i, entry.count * right_total, 0.0);
    }
    for (j, entry) in right.iter().enumerate() {
        network.add_edge(1 + left.len() + j, sink, entry.count * left_total, 0.0);
    }
    for (i, from) in left.iter().enumerate() {
        for (j, to) in right.iter().enumerate() {
            let cost = euclidean(from.vector, to.vector);
            network.add_edge(1 + i, 1 + left.len() + j, from.count * right_total, cost);
        }
    }

    let scale = (left_total * right_total) as f64;
    network.min_cost_flow(source, sink) / scale
}

struct HistogramEntry<'e> {
    count: u64,
    vector: &'e [f32],
}

/// Collapses tokens into (count, vector) entries, dropping anything the
/// table does not know. Insertion order is kept so results are deterministic.
fn vocab_histogram<'e>(
    tokens: &[String],
    embeddings: &'e WordEmbeddings,
) -> Vec<HistogramEntry<'e>> {
    let mut index: FxHashMap<&str, usize> = FxHashMap::default();
    let mut entries: Vec<HistogramEntry<'e>> = Vec::new();

    for token in tokens {
        if let Some(&slot) = index.get(token.as_str()) {
            entries[slot].count += 1;
        } else if let Some(vector) = embeddings.lookup(token) {
            index.insert(token.as_str(), entries.len());
            entries.push(HistogramEntry { count: 1, vector });
        }
    }

    entries
}

fn euclidean(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let diff = f64::from(*x) - f64::from(*y);
            diff * diff
        })
        .sum::<f64>()
        .sqrt()
}

struct FlowEdge {
    to: usize,
    rev: usize,
    cap: u64,
    cost: f64,
}

/// Dense-graph min-cost max-flow via successive shortest paths with Johnson
/// potentials. Node counts here are tiny (distinct words in two short
/// texts), so the quadratic Dijkstra is plenty.
struct FlowNetwork {
    graph: Vec<Vec<FlowEdge>>,
}

impl FlowNetwork {
    fn new(nodes: usize) -> Self {
        Self {
            graph: (0..nodes).map(|_| Vec::new()).collect(),
        }
    }

    fn add_edge(&mut self, from: usize, to: usize, cap: u64, cost: f64) {
        let rev_in_to = self.graph[to].len();
        let rev_in_from = self.graph[from].len();
        self.graph[from].push(FlowEdge {
            to,
            rev: rev_in_to,
            cap,
            cost,
        });
        self.graph[to].push(FlowEdge {
            to: from,
            rev: rev_in_from,
            cap: 0,
            cost: -cost,
        });
    }

    fn min_cost_flow(&mut self, source: usize, sink: usize) -> f64 {
        let nodes = self.graph.len();
        let mut potential = vec![0.0f64; nodes];
        let mut total_cost = 0.0f64;

        loop {
            let mut dist = vec![f64::INFINITY; nodes];
            let mut done = vec![false; nodes];
            let mut prev_node = vec![usize::MAX; nodes];
            let mut prev_edge = vec![usize::MAX; nodes];
            dist[source] = 0.0;

            loop {
                let mut current = usize::MAX;
                let mut best = f64::INFINITY;
                for node in 0..nodes {
                    if !done[node] && dist[node] < best {
                        best = dist[node];
                        current = node;
                    }
                }
                if current == usize::MAX {
                    break;
                }
                done[current] = true;

                for (edge_index, edge) in self.graph[current].iter().enumerate() {
                    if edge.cap == 0 {
                        continue;
                    }
                    let candidate =
                        dist[current] + edge.cost + potential[current] - potential[edge.to];
                    if candidate < dist[edge.to] {
                        dist[edge.to] = candidate;
                        prev_node[edge.to] = current;
                        prev_edge[edge.to] = edge_index;
                    }
                }
            }

            if dist[sink].is_infinite() {
                break;
            }
            for node in 0..nodes {
                if dist[node].is_finite() {
                    potential[node] += dist[node];
                }
            }

            let mut bottleneck = u64::MAX;
            let mut node = sink;
            while node != source {
                let parent = prev_node[node];
                bottleneck = bottleneck.min(self.graph[parent][prev_edge[node]].cap);
                node = parent;
            }

            let mut node = sink;
            while node != source {
                let parent = prev_node[node];
                let edge_index = prev_edge[node];
                let (rev, cost) = {
                    let edge = &self.graph[parent][edge_index];
                    (edge.rev, edge.cost)
                };
                self.graph[parent][edge_index].cap -= bottleneck;
                self.graph[node][rev].cap += bottleneck;
                total_cost += cost * bottleneck as f64;
                node = parent;
            }
        }

        total_cost
    }
}
