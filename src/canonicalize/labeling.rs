//! Canonical blank-node labeling (URDNA2015).
//!
//! Assigns stable `c14n`-prefixed labels to blank nodes from the quads
//! they appear in: per-node first-degree hashes resolve most nodes, and
//! the remaining groups are broken apart by recursive N-degree hashing
//! with an explicit deterministic tie-break. Nothing here depends on hash
//! map iteration order; every grouping structure is a `BTreeMap`.

use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};

use super::nquads::{Quad, Term};

/// Compute the canonical label for every blank node appearing in `quads`
pub(crate) fn canonical_labels(quads: &[Quad]) -> HashMap<String, String> {
    let mut bnode_quads: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (index, quad) in quads.iter().enumerate() {
        for term in [Some(&quad.subject), Some(&quad.object), quad.graph.as_ref()]
            .into_iter()
            .flatten()
        {
            if let Some(label) = term.blank_label() {
                let entries = bnode_quads.entry(label.to_string()).or_default();
                if entries.last() != Some(&index) {
                    entries.push(index);
                }
            }
        }
    }

    let mut canonical = IdentifierIssuer::new("c14n");
    if bnode_quads.is_empty() {
        return canonical.issued;
    }

    // First-degree hashes; nodes with a unique hash get canonical labels
    // immediately, in hash order.
    let mut hash_to_bnodes: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for bnode in bnode_quads.keys() {
        let hash = hash_first_degree(quads, &bnode_quads, bnode);
        hash_to_bnodes.entry(hash).or_default().push(bnode.clone());
    }

    let mut non_unique: Vec<Vec<String>> = Vec::new();
    for bnodes in hash_to_bnodes.into_values() {
        if let [bnode] = bnodes.as_slice() {
            canonical.issue(bnode);
        } else {
            non_unique.push(bnodes);
        }
    }

    // Remaining groups, still in first-degree hash order: hash each member
    // N-degrees deep against a scratch issuer, then issue canonical labels
    // following the sorted N-degree results.
    for group in non_unique {
        let mut results: Vec<(String, IdentifierIssuer)> = Vec::new();
        for bnode in &group {
            let mut scratch = IdentifierIssuer::new("b");
            scratch.issue(bnode);
            results.push(hash_n_degree(quads, &bnode_quads, bnode, scratch, &canonical));
        }
        results.sort_by(|a, b| a.0.cmp(&b.0));
        for (_, issuer) in results {
            for bnode in &issuer.order {
                canonical.issue(bnode);
            }
        }
    }

    canonical.issued
}

/// Hash the quads incident to `bnode` with the node itself serialized as
/// `_:a` and every other blank node as `_:z`
fn hash_first_degree(
    quads: &[Quad],
    bnode_quads: &BTreeMap<String, Vec<usize>>,
    bnode: &str,
) -> String {
    let mut nquads: Vec<String> = bnode_quads
        .get(bnode)
        .map(Vec::as_slice)
        .unwrap_or_default()
        .iter()
        .map(|&index| {
            quads[index].serialize_with(|label| {
                if label == bnode {
                    "a".to_string()
                } else {
                    "z".to_string()
                }
            })
        })
        .collect();
    nquads.sort();

    let mut hasher = Sha256::new();
    for line in &nquads {
        hasher.update(line.as_bytes());
    }
    hex::encode(hasher.finalize())
}

/// Hash one blank node related to the node currently being N-degree
/// hashed, from its position, the connecting predicate, and the best
/// identifier known for it so far
fn hash_related(
    quads: &[Quad],
    bnode_quads: &BTreeMap<String, Vec<usize>>,
    related: &str,
    quad: &Quad,
    position: char,
    issuer: &IdentifierIssuer,
    canonical: &IdentifierIssuer,
) -> String {
    let mut input = String::new();
    input.push(position);
    if position != 'g' {
        input.push('<');
        input.push_str(&quad.predicate);
        input.push('>');
    }

    if let Some(id) = canonical.get(related) {
        input.push_str("_:");
        input.push_str(id);
    } else if let Some(id) = issuer.get(related) {
        input.push_str("_:");
        input.push_str(id);
    } else {
        input.push_str(&hash_first_degree(quads, bnode_quads, related));
    }

    hex::encode(Sha256::digest(input.as_bytes()))
}

/// N-degree hash: group the related blank nodes by their related-hash,
/// then explore label-assignment permutations per group, keeping the
/// lexicographically least path
fn hash_n_degree(
    quads: &[Quad],
    bnode_quads: &BTreeMap<String, Vec<usize>>,
    identifier: &str,
    mut issuer: IdentifierIssuer,
    canonical: &IdentifierIssuer,
) -> (String, IdentifierIssuer) {
    let mut hash_to_related: BTreeMap<String, Vec<String>> = BTreeMap::new();
    if let Some(indices) = bnode_quads.get(identifier) {
        for &index in indices {
            let quad = &quads[index];
            for (position, term) in [
                ('s', Some(&quad.subject)),
                ('o', Some(&quad.object)),
                ('g', quad.graph.as_ref()),
            ] {
                let Some(related) = term.and_then(Term::blank_label) else {
                    continue;
                };
                if related == identifier {
                    continue;
                }
                let hash =
                    hash_related(quads, bnode_quads, related, quad, position, &issuer, canonical);
                hash_to_related.entry(hash).or_default().push(related.to_string());
            }
        }
    }

    let mut data_to_hash = String::new();
    for (related_hash, related_list) in &hash_to_related {
        data_to_hash.push_str(related_hash);

        let mut chosen_path = String::new();
        let mut chosen_issuer: Option<IdentifierIssuer> = None;

        for permutation in permutations(related_list) {
            let mut issuer_copy = issuer.clone();
            let mut path = String::new();
            let mut recursion_list: Vec<String> = Vec::new();
            let mut skip = false;

            for related in &permutation {
                if let Some(id) = canonical.get(related) {
                    path.push_str("_:");
                    path.push_str(id);
                } else {
                    if issuer_copy.get(related).is_none() {
                        recursion_list.push(related.clone());
                    }
                    let id = issuer_copy.issue(related);
                    path.push_str("_:");
                    path.push_str(&id);
                }
                if !chosen_path.is_empty()
                    && path.len() >= chosen_path.len()
                    && path > chosen_path
                {
                    skip = true;
                    break;
                }
            }
            if skip {
                continue;
            }

            for related in &recursion_list {
                let (hash, result_issuer) =
                    hash_n_degree(quads, bnode_quads, related, issuer_copy.clone(), canonical);
                let id = issuer_copy.issue(related);
                path.push_str("_:");
                path.push_str(&id);
                path.push('<');
                path.push_str(&hash);
                path.push('>');
                issuer_copy = result_issuer;
                if !chosen_path.is_empty()
                    && path.len() >= chosen_path.len()
                    && path > chosen_path
                {
                    skip = true;
                    break;
                }
            }
            if skip {
                continue;
            }

            if chosen_path.is_empty() || path < chosen_path {
                chosen_path = path;
                chosen_issuer = Some(issuer_copy);
            }
        }

        data_to_hash.push_str(&chosen_path);
        if let Some(chosen) = chosen_issuer {
            issuer = chosen;
        }
    }

    (hex::encode(Sha256::digest(data_to_hash.as_bytes())), issuer)
}

/// Issues stable identifiers in request order
#[derive(Clone, Debug)]
struct IdentifierIssuer {
    prefix: &'static str,
    counter: usize,
    issued: HashMap<String, String>,
    order: Vec<String>,
}

impl IdentifierIssuer {
    fn new(prefix: &'static str) -> Self {
        Self {
            prefix,
            counter: 0,
            issued: HashMap::new(),
            order: Vec::new(),
        }
    }

    fn issue(&mut self, identifier: &str) -> String {
        if let Some(existing) = self.issued.get(identifier) {
            return existing.clone();
        }
        let issued = format!("{}{}", self.prefix, self.counter);
        self.counter += 1;
        self.issued.insert(identifier.to_string(), issued.clone());
        self.order.push(identifier.to_string());
        issued
    }

    fn get(&self, identifier: &str) -> Option<&str> {
        self.issued.get(identifier).map(String::as_str)
    }
}

/// All permutations of `items`, starting from sorted order
fn permutations(items: &[String]) -> Vec<Vec<String>> {
    let mut sorted = items.to_vec();
    sorted.sort();
    let mut out = Vec::new();
    permute(&mut sorted, 0, &mut out);
    out
}

fn permute(items: &mut Vec<String>, start: usize, out: &mut Vec<Vec<String>>) {
    if start == items.len() {
        out.push(items.clone());
        return;
    }
    for i in start..items.len() {
        items.swap(start, i);
        permute(items, start + 1, out);
        items.swap(start, i);
    }
}
