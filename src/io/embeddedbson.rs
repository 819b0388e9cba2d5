//! module to do bson io for embedding results
//!
//!  Data are formatted in bson Documents, each value has a key.
//!
//!  The encoding is done in 2 parts:
//! 1. A header document with key "header". The structure is described below see struct [Header](EmbeddedBsonHeader)
//! - a version index
//! - base type name, f64 for the landmark embedding, encoded as a String. key is type_name.
//! - dimension of vectors
//! - number of vectors
//!
//! 2. The embedded vectors, one document by node : the vector of node of rank i has key "i".
//!    Ranks are ranks in the combined graph, so nodes of the second graph follow those of the first graph.
//!

// Note : a Bson document must not be larger than 16Mb!
// So we have one Document by node in the file dumped

use anyhow::anyhow;

use std::fs::OpenOptions;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use bson::{bson, Bson, Document};
use serde::{Deserialize, Serialize};

use ndarray::{Array2, ArrayView1};
use num_traits::cast::FromPrimitive;

use crate::embedding::*;
use crate::io;

/// This structure defines the header of the bson document
#[derive(Debug, Serialize, Deserialize)]
pub struct EmbeddedBsonHeader {
    /// version of dump format
    pub version: i64,
    /// encodes type of vectors used in the embedding.
    pub type_name: String,
    /// dimension of the embedding (length of vectors)
    pub dimension: i64,
    /// number of vectors.
    pub nbdata: i64,
} // end of EmbeddedBsonHeader

// conversion of ranks and sizes, bson stores integers as i64
fn to_i64(value: usize) -> anyhow::Result<i64> {
    FromPrimitive::from_usize(value).ok_or_else(|| anyhow!("cannot encode {} as i64", value))
}

/// dump embedded vectors in bson format in file given by output.
/// The dump consists in a header document then each node is dumped in its document (a bson document must less than 16Mb)
pub fn bson_dump<F>(embedded: &Embedded<F>, output: &io::output::Output) -> Result<(), anyhow::Error>
where
    F: Serialize + Clone,
{
    //
    log::info!("entering bson_dump");
    //
    let path = output.get_path();
    let fileres = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path);
    let file = match fileres {
        Ok(file) => file,
        Err(e) => return Err(anyhow!("could not open file : {}, {}", path.display(), e)),
    };
    let mut bufwriter = BufWriter::new(file);
    // dump header part
    let dim = to_i64(embedded.get_dimension())?;
    let nbdata = to_i64(embedded.get_nb_nodes())?;
    let bson_header = bson!({
        "version": 1_i64,
        "type_name": std::any::type_name::<F>(),
        "dimension": dim,
        "nbdata": nbdata
        }
    );
    let mut doc = Document::new();
    doc.insert("header", bson_header);
    if let Err(e) = doc.to_writer(&mut bufwriter) {
        log::error!("dump of bson header in {} failed", path.display());
        return Err(anyhow!("dump of bson failed: {}", e));
    }
    // now loop on data vectors
    for i in 0..embedded.get_nb_nodes() {
        let mut doc = Document::new();
        let data = embedded
            .get_embedded_node(i)
            .iter()
            .map(bson::to_bson)
            .collect::<Result<Vec<Bson>, _>>()?;
        doc.insert(i.to_string(), data);
        if let Err(e) = doc.to_writer(&mut bufwriter) {
            log::error!("bson dump error in node {i}");
            return Err(anyhow!("bson dump error for node {i} {}", e));
        }
    }
    bufwriter.flush()?;
    //
    log::info!("bson dump in file {} finished", path.display());
    //
    Ok(())
} // end of bson_dump

// reads the header document
fn read_header<R: std::io::Read>(reader: &mut R, path: &Path) -> anyhow::Result<EmbeddedBsonHeader> {
    let doc = match Document::from_reader(reader) {
        Ok(doc) => doc,
        Err(e) => {
            log::error!("could not load document from file {}", path.display());
            return Err(anyhow!(e));
        }
    };
    let bson_header = match doc.get("header") {
        Some(header) => header.clone(),
        None => {
            log::error!("could not load header from file {}", path.display());
            return Err(anyhow!("could not find header in document"));
        }
    };
    let header: EmbeddedBsonHeader = bson::from_bson(bson_header)?;
    Ok(header)
} // end of read_header

/// returns the bson header of an embedding.
/// This can be useful to retrieve the type of the embedding (dumped via a call to std::any::type_name::\<F\>()).
pub fn get_bson_header(fname: &str) -> Result<EmbeddedBsonHeader, anyhow::Error> {
    let path = Path::new(fname);
    log::info!("get_bson_header: trying to open file : {:?}", path);
    let file = match OpenOptions::new().read(true).open(path) {
        Ok(file) => file,
        Err(e) => {
            log::error!("reload of bson dump failed");
            return Err(anyhow!("reload failed: {}", e));
        }
    };
    let mut bufreader = BufReader::new(file);
    let header = read_header(&mut bufreader, path)?;
    log::info!(" bson header reloaded");
    Ok(header)
} // end of get_bson_header

/// reloads embedded vectors from a previous bson dump.
pub fn bson_load<F>(fname: &str) -> Result<Array2<F>, anyhow::Error>
where
    F: num_traits::Zero + Clone + serde::de::DeserializeOwned,
{
    //
    log::info!("entering bson_load, file name : {:?}", fname);
    //
    let path = Path::new(fname);
    let file = match OpenOptions::new().read(true).open(path) {
        Ok(file) => file,
        Err(e) => {
            log::error!("reload of bson dump failed");
            return Err(anyhow!("reload failed: {}", e));
        }
    };
    let mut bufreader = BufReader::new(file);
    let header = read_header(&mut bufreader, path)?;
    log::info!("header : {:?}", header);
    if header.version != 1 {
        log::error!("header format version : {}", header.version);
        return Err(anyhow!("format version error, inconsistent with header"));
    }
    let type_name = std::any::type_name::<F>();
    if header.type_name != type_name {
        log::error!(
            "header as type name : {}, reloading with : {}",
            header.type_name,
            type_name
        );
        return Err(anyhow!("type error, inconsistent with header"));
    }
    let nb_data: usize = FromPrimitive::from_i64(header.nbdata).ok_or_else(|| anyhow!("bad nbdata in header"))?;
    let dim: usize = FromPrimitive::from_i64(header.dimension).ok_or_else(|| anyhow!("bad dimension in header"))?;
    log::debug!("bson_load , nb_data = {nb_data}, dim : {dim}");
    //
    let mut array = Array2::<F>::zeros((0, dim));
    for i in 0..nb_data {
        // we have one document for each node
        let doc = match Document::from_reader(&mut bufreader) {
            Ok(doc) => doc,
            Err(e) => {
                log::error!("could not load document for node {i} from file {}", path.display());
                return Err(anyhow!(e));
            }
        };
        let key = i.to_string();
        let value = match doc.get(&key) {
            Some(value) => value.clone(),
            None => {
                log::error!("could not get record for key {:?}", key);
                return Err(anyhow!("could not get record for key {:?}", key));
            }
        };
        let data_1d: Vec<F> = bson::from_bson(value).map_err(|e| anyhow!("bson decoding error for node {i} : {}", e))?;
        if array.push_row(ArrayView1::from(data_1d.as_slice())).is_err() {
            return Err(anyhow!("could not insert array vector {:?}, dimension {}", i, data_1d.len()));
        }
    }
    log::info!("\t finished bson decoding of {} embedded vectors", nb_data);
    Ok(array)
} // end of bson_load

// end of mod tests
