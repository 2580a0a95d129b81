//! Reading input trees and writing the annotated result.
//!
//! Parsing and serialisation are delegated to `phylotree`; this module only
//! prepares the text (NEXUS blocks, bracketed annotations, gzip) and converts
//! between `phylotree::tree::Tree` and [`SupportTree`].

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::str::FromStr;

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use phylotree::tree::{Node as PhyloNode, Tree as PhyloTree};
use tracing::debug;

use crate::error::{MapperError, Result};
use crate::tree::{Node, NodeId, SupportTree};

/// On-disk tree format, as accepted by `-f/--tree-format`.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, clap::ValueEnum)]
pub enum TreeFormat {
    #[default]
    Newick,
    Nexus,
}

impl FromStr for TreeFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "newick" => Ok(TreeFormat::Newick),
            "nexus" => Ok(TreeFormat::Nexus),
            other => Err(format!("unsupported tree format '{other}' (expected newick or nexus)")),
        }
    }
}

fn is_gz(path: &Path) -> bool {
    path.to_string_lossy().ends_with(".gz")
}

/// Read a whole file, gunzipping it when the name ends with `.gz`.
pub fn read_text<P: AsRef<Path>>(path: P) -> io::Result<String> {
    let p = path.as_ref();
    let file = File::open(p)?;
    let mut content = String::new();
    if is_gz(p) {
        GzDecoder::new(BufReader::new(file)).read_to_string(&mut content)?;
    } else {
        BufReader::new(file).read_to_string(&mut content)?;
    }
    Ok(content)
}

/// Read the first tree of `path`.
///
/// # Errors
/// [`MapperError::Read`] when the file cannot be read or decoded, parse errors,
/// [`MapperError::NoTreeFound`] for files without a tree.
pub fn read_tree<P: AsRef<Path>>(path: P, format: TreeFormat) -> Result<SupportTree> {
    let p = path.as_ref();
    let content = read_text(p).map_err(|source| MapperError::Read {
        path: p.to_path_buf(),
        source,
    })?;
    let tree = match format {
        TreeFormat::Newick => parse_newick(&content)?,
        TreeFormat::Nexus => parse_nexus(&content)?,
    };
    tree.ok_or_else(|| MapperError::NoTreeFound { path: p.to_path_buf() })
}

/// Parse the first Newick tree of `text`; `Ok(None)` when `text` is blank.
pub fn parse_newick(text: &str) -> Result<Option<SupportTree>> {
    let cleaned = lift_annotations(text);
    if cleaned.is_empty() {
        return Ok(None);
    }
    // phylotree stops at the first ';' anyway, drop trailing trees explicitly
    let first = match cleaned.find(';') {
        Some(end) => &cleaned[..=end],
        None => cleaned.as_str(),
    };
    let phylo = PhyloTree::from_newick(first)?;
    Ok(Some(from_phylotree(&phylo)?))
}

/// Parse the first `TREE` statement of a NEXUS `TREES` block, resolving leaf
/// names through the `TRANSLATE` table when present.
pub fn parse_nexus(content: &str) -> Result<Option<SupportTree>> {
    let translate = parse_translate_block(content);
    let Some(block) = collect_tree_blocks(content).into_iter().next() else {
        return Ok(None);
    };
    debug!(header = block.header, translated = translate.len(), "reading NEXUS tree");
    let Some(mut tree) = parse_newick(block.body)? else {
        return Ok(None);
    };
    if !translate.is_empty() {
        rename_leaf_nodes(&mut tree, &translate);
    }
    Ok(Some(tree))
}

struct TreeBlock<'a> {
    header: &'a str,
    body: &'a str,
}

fn collect_tree_blocks(content: &str) -> Vec<TreeBlock<'_>> {
    content
        .lines()
        .map(str::trim)
        .skip_while(|line| !line.to_ascii_uppercase().starts_with("TREE "))
        .take_while(|line| !line.to_ascii_uppercase().starts_with("END;"))
        .filter_map(|line| {
            // header never contains '=', annotations in the body may
            let (header, body) = line.split_once('=')?;
            Some(TreeBlock {
                header: header.trim(),
                body: body.trim(),
            })
        })
        .collect()
}

fn parse_translate_block(content: &str) -> HashMap<String, String> {
    // ASCII uppercasing keeps byte offsets valid for `content`
    let upper = content.to_ascii_uppercase();
    let Some(start) = upper
        .match_indices("TRANSLATE")
        .map(|(i, kw)| i + kw.len())
        .find(|&end| {
            let before = upper[..end - "TRANSLATE".len()].chars().next_back();
            let after = upper[end..].chars().next();
            before.is_none_or(char::is_whitespace) && after.is_some_and(char::is_whitespace)
        })
    else {
        return HashMap::new();
    };

    // STRUCTURE:
    //   translate 1 'Homo sapiens', 2 Pan_troglodytes,
    //     3 Gorilla;
    translate_entries(&content[start..])
        .into_iter()
        .filter_map(|entry| {
            let (id, label) = entry.trim().split_once(char::is_whitespace)?;
            Some((id.to_string(), unquote(label.trim())))
        })
        .collect()
}

/// Comma-separated entries up to the first `;`, ignoring both inside quotes.
fn translate_entries(body: &str) -> Vec<&str> {
    let mut entries = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;
    for (i, c) in body.char_indices() {
        match c {
            '\'' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                entries.push(&body[start..i]);
                start = i + 1;
            }
            ';' if !in_quotes => {
                entries.push(&body[start..i]);
                return entries;
            }
            _ => {}
        }
    }
    entries.push(&body[start..]);
    entries
}

/// Strip Newick quoting: `'it''s'` becomes `it's`, `"A B"` becomes `A B`.
fn unquote(label: &str) -> String {
    let quoted = |q: char| label.len() >= 2 && label.starts_with(q) && label.ends_with(q);
    if quoted('\'') {
        label[1..label.len() - 1].replace("''", "'")
    } else if quoted('"') {
        label[1..label.len() - 1].to_string()
    } else {
        label.to_string()
    }
}

/// Quote `label` for Newick output when it holds whitespace or punctuation.
fn quote_label(label: String) -> String {
    if label.chars().any(|c| c.is_whitespace() || "()[]':;,\"".contains(c)) {
        format!("'{}'", label.replace('\'', "''"))
    } else {
        label
    }
}

fn rename_leaf_nodes(tree: &mut SupportTree, translate: &HashMap<String, String>) {
    for node in tree.nodes_mut() {
        if !node.is_leaf() {
            continue;
        }
        if let Some(name) = node.label.as_ref().and_then(|n| translate.get(n)) {
            node.label = Some(name.clone());
        }
    }
}

/// Strip whitespace and bracketed comments from a Newick string.
///
/// BEAST and MrBayes write clade posteriors as node annotations, e.g.
/// `(A,B)[&prob=0.98,...]:0.1`. When such an annotation directly follows a
/// closing parenthesis (the node has no label of its own) its `prob` or
/// `posterior` value is kept as the node label, so it is read as the node's
/// support. Every other comment is dropped.
///
/// Quoted labels keep their whitespace. Single quotes are rewritten as double
/// quotes, the only kind `phylotree` understands; `''` inside them is an
/// escaped quote.
fn lift_annotations(newick: &str) -> String {
    let mut result = String::with_capacity(newick.len());
    let mut quote: Option<char> = None;
    let mut chars = newick.chars().peekable();

    while let Some(ch) = chars.next() {
        match quote {
            Some('\'') if ch == '\'' => {
                if chars.peek() == Some(&'\'') {
                    chars.next();
                    result.push('\'');
                } else {
                    quote = None;
                    result.push('"');
                }
            }
            Some(q) if ch == q => {
                quote = None;
                result.push('"');
            }
            Some(_) => result.push(ch),
            None => match ch {
                '\'' | '"' => {
                    quote = Some(ch);
                    result.push('"');
                }
                '[' => {
                    let body: String = chars.by_ref().take_while(|&c| c != ']').collect();
                    if result.ends_with(')') {
                        if let Some(value) = body.strip_prefix('&').and_then(annotation_support)
                        {
                            result.push_str(value);
                        }
                    }
                }
                c if c.is_whitespace() => {}
                c => result.push(c),
            },
        }
    }

    result
}

/// Value of the `prob` / `posterior` key of a `key=value,...` annotation body.
/// Commas inside `{...}` belong to the value.
fn annotation_support(body: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut start = 0;
    let mut fields = Vec::new();
    for (i, c) in body.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                fields.push(&body[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    fields.push(&body[start..]);

    fields.into_iter().find_map(|field| {
        let (key, value) = field.split_once('=')?;
        let key = key.trim().to_ascii_lowercase();
        let value = value.trim();
        ((key == "prob" || key == "posterior") && value.parse::<f64>().is_ok()).then_some(value)
    })
}

/// Parse an internal node label as a support value.
fn parse_support(label: &str) -> Option<f64> {
    label.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Convert a parsed `phylotree` tree. Numeric internal labels become support
/// values; any other label is kept verbatim.
pub fn from_phylotree(phylo: &PhyloTree) -> Result<SupportTree> {
    let mut tree = SupportTree::new();
    let root = phylo.get_root()?;
    let mut stack: Vec<(usize, Option<NodeId>)> = vec![(root, None)];

    while let Some((phylo_id, parent)) = stack.pop() {
        let source = phylo.get(&phylo_id)?;
        let mut node = Node::new();
        node.length = source.parent_edge;

        let label = source
            .name
            .as_deref()
            .map(|n| unquote(n.trim()))
            .filter(|n| !n.is_empty());
        match label {
            Some(l) if !source.children.is_empty() => match parse_support(&l) {
                Some(value) => node = node.with_support(value),
                None => node.label = Some(l),
            },
            other => node.label = other,
        }

        let id = match parent {
            None => tree.add_root(node),
            Some(p) => tree.add_child(p, node),
        };
        stack.extend(source.children.iter().rev().map(|&c| (c, Some(id))));
    }

    Ok(tree)
}

/// Integral BP values are written without a fractional part.
fn format_bp(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

/// Label written for `node`: taxon name for leaves, `BP/PP` for internal nodes.
///
/// A missing or hidden side renders as `-`; nothing is written when neither
/// side has something to show. A non-numeric input label stands in for BP.
pub fn render_label(node: &Node) -> Option<String> {
    if node.is_leaf() {
        return node.label.clone().map(quote_label);
    }
    let bp = match node.support {
        Some(s) => s.visible().map(format_bp),
        None => node.label.clone(),
    };
    let pp = node.posterior.and_then(|s| s.visible()).map(|v| v.to_string());
    match (bp, pp) {
        (None, None) => None,
        (bp, pp) => Some(quote_label(format!(
            "{}/{}",
            bp.as_deref().unwrap_or("-"),
            pp.as_deref().unwrap_or("-")
        ))),
    }
}

/// Rebuild the annotated tree as a `phylotree` tree with rendered labels.
pub fn to_phylotree(tree: &SupportTree) -> Result<PhyloTree> {
    let mut out = PhyloTree::new();
    let Some(root) = tree.root() else {
        return Ok(out);
    };
    let mut stack: Vec<(NodeId, Option<usize>)> = vec![(root, None)];

    while let Some((id, parent)) = stack.pop() {
        let source = tree.get(id);
        let mut node = PhyloNode::new();
        node.name = render_label(source);

        let phylo_id = match parent {
            None => {
                let idx = out.add(node);
                out.get_mut(&idx)?.parent_edge = source.length;
                idx
            }
            Some(p) => out.add_child(node, p, source.length)?,
        };
        stack.extend(source.children.iter().rev().map(|&c| (c, Some(phylo_id))));
    }

    Ok(out)
}

/// Serialise the annotated tree as a Newick string terminated by `;`.
pub fn render_newick(tree: &SupportTree) -> Result<String> {
    Ok(to_phylotree(tree)?.to_newick()?)
}

/// Write `newick` to `path`, gzip-compressed if the name ends with `.gz`.
pub fn write_tree<P: AsRef<Path>>(path: P, newick: &str) -> io::Result<()> {
    let p = path.as_ref();
    let mut out: Box<dyn Write> = if is_gz(p) {
        let f = File::create(p)?;
        let enc = GzEncoder::new(f, Compression::default());
        Box::new(BufWriter::new(enc))
    } else {
        Box::new(BufWriter::new(File::create(p)?))
    };

    writeln!(&mut out, "{newick}")?;
    out.flush()?;
    Ok(())
}
