//! Construct a graph, or a ground truth, from data in a csv file.
//!
//! Files are lists of records of 2 integer fields (a 3rd field, a weight for example, is ignored).
//! Lines beginning with # or % are comments. The delimiter is detected on the first data line:
//! tab, comma or (possibly repeated) blank.

use anyhow::anyhow;

use std::fs::OpenOptions;
use std::io::{BufRead, BufReader};
use std::path::Path;

use ahash::AHashMap;
use csv::ReaderBuilder;
use ndarray::Array2;

use crate::graph::AlignGraph;

// returns the data lines of the file and the delimiter they use
fn read_data_lines(filepath: &Path) -> anyhow::Result<(String, u8)> {
    let fileres = OpenOptions::new().read(true).open(filepath);
    let file = match fileres {
        Ok(file) => file,
        Err(e) => {
            log::error!("could not open file {:?}", filepath.as_os_str());
            return Err(anyhow!("could not open file {} : {}", filepath.display(), e));
        }
    };
    let bufreader = BufReader::new(file);
    let mut data = String::new();
    let mut delim: Option<u8> = None;
    let mut nb_comments = 0;
    for line in bufreader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('%') {
            nb_comments += 1;
            continue;
        }
        if delim.is_none() {
            delim = if trimmed.contains('\t') {
                Some(b'\t')
            } else if trimmed.contains(',') {
                Some(b',')
            } else {
                Some(b' ')
            };
        }
        data.push_str(trimmed);
        data.push('\n');
    }
    log::debug!("file {} : {} comment or blank lines skipped", filepath.display(), nb_comments);
    Ok((data, delim.unwrap_or(b' ')))
} // end of read_data_lines

// decodes the records of 2 integer fields
fn read_pairs(filepath: &Path) -> anyhow::Result<Vec<(usize, usize)>> {
    let (data, delim) = read_data_lines(filepath)?;
    let mut rdr = ReaderBuilder::new()
        .delimiter(delim)
        .flexible(true)
        .has_headers(false)
        .from_reader(data.as_bytes());
    let mut pairs = Vec::<(usize, usize)>::new();
    for (nb_record, result) in rdr.records().enumerate() {
        let record = result?;
        // repeated blanks give empty fields
        let fields: Vec<&str> = record.iter().map(|f| f.trim()).filter(|f| !f.is_empty()).collect();
        if fields.len() < 2 {
            return Err(anyhow!(
                "record {} of {} has less than 2 fields",
                nb_record + 1,
                filepath.display()
            ));
        }
        let node1 = fields[0]
            .parse::<usize>()
            .map_err(|_| anyhow!("error decoding field 1 of record {}", nb_record + 1))?;
        let node2 = fields[1]
            .parse::<usize>()
            .map_err(|_| anyhow!("error decoding field 2 of record {}", nb_record + 1))?;
        pairs.push((node1, node2));
    }
    Ok(pairs)
} // end of read_pairs

/// reads an edge list. Returns number of nodes (largest node rank + 1) and edges.
pub fn edges_from_csv(filepath: &Path) -> anyhow::Result<(usize, Vec<(usize, usize)>)> {
    let edges = read_pairs(filepath)?;
    let nb_nodes = edges.iter().map(|(a, b)| a.max(b) + 1).max().unwrap_or(0);
    log::info!(
        "read {} edges from {}, nb nodes : {}",
        edges.len(),
        filepath.display(),
        nb_nodes
    );
    Ok((nb_nodes, edges))
} // end of edges_from_csv

/// reads an edge list and constructs the undirected graph.
/// If nb_nodes is None the number of nodes is deduced from the edges
pub fn graph_from_csv(filepath: &Path, nb_nodes: Option<usize>, attributes: Option<Array2<f64>>) -> anyhow::Result<AlignGraph> {
    let (nb_from_edges, edges) = edges_from_csv(filepath)?;
    let nb_nodes = nb_nodes.unwrap_or(nb_from_edges);
    let graph = AlignGraph::from_edges(nb_nodes, &edges, attributes)
        .map_err(|e| anyhow!("graph construction from {} failed : {}", filepath.display(), e))?;
    Ok(graph)
} // end of graph_from_csv

/// reads a ground truth : each record gives a node of the first graph and its partner in the second graph.
pub fn truth_from_csv(filepath: &Path) -> anyhow::Result<AHashMap<usize, usize>> {
    let pairs = read_pairs(filepath)?;
    let mut truth = AHashMap::<usize, usize>::with_capacity(pairs.len());
    for (node, partner) in pairs {
        if let Some(previous) = truth.insert(node, partner) {
            log::error!("node {} has 2 partners {} and {}", node, previous, partner);
            return Err(anyhow!("node {} appears twice in ground truth", node));
        }
    }
    log::info!("read ground truth for {} nodes", truth.len());
    Ok(truth)
} // end of truth_from_csv

//========================================================================================

#[cfg(test)]
mod tests {

    use super::*;
    use std::io::Write;

    fn log_init_test() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn write_tmp(name: &str, content: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_edges_delimiters() {
        log_init_test();
        let tab = write_tmp("structalign_tab.csv", "% a comment\n0\t1\n1\t2\n\n2\t3\t0.5\n");
        let (nb_nodes, edges) = edges_from_csv(&tab).unwrap();
        assert_eq!(nb_nodes, 4);
        assert_eq!(edges, vec![(0, 1), (1, 2), (2, 3)]);
        //
        let comma = write_tmp("structalign_comma.csv", "# header\n0,4\n3,1\n");
        let (nb_nodes, edges) = edges_from_csv(&comma).unwrap();
        assert_eq!(nb_nodes, 5);
        assert_eq!(edges, vec![(0, 4), (3, 1)]);
        //
        let blank = write_tmp("structalign_blank.csv", "0  1\n 1 2\n");
        let graph = graph_from_csv(&blank, Some(4), None).unwrap();
        assert_eq!(graph.nb_nodes(), 4);
        assert_eq!(graph.degree(1), 2);
        assert_eq!(graph.degree(3), 0);
    } // end of test_edges_delimiters

    #[test]
    fn test_bad_records() {
        log_init_test();
        let bad = write_tmp("structalign_bad.csv", "0 1\n1 x\n");
        assert!(edges_from_csv(&bad).is_err());
        let short = write_tmp("structalign_short.csv", "0 1\n2\n");
        assert!(edges_from_csv(&short).is_err());
        assert!(edges_from_csv(Path::new("/nonexistent/structalign.csv")).is_err());
        // edge out of declared range
        let edges = write_tmp("structalign_range.csv", "0 1\n1 5\n");
        assert!(graph_from_csv(&edges, Some(3), None).is_err());
    } // end of test_bad_records

    #[test]
    fn test_truth() {
        log_init_test();
        let path = write_tmp("structalign_truth.txt", "0 2\n1 0\n2 1\n");
        let truth = truth_from_csv(&path).unwrap();
        assert_eq!(truth.len(), 3);
        assert_eq!(truth.get(&1), Some(&0));
        let dup = write_tmp("structalign_truth_dup.txt", "0 2\n0 1\n");
        assert!(truth_from_csv(&dup).is_err());
    } // end of test_truth
} // end of mod tests
