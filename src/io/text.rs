//! Dense matrices as text : one row by line, values separated by blanks.
//!
//! Used to read node attributes and to dump the alignment matrix.
//! Values are written with format {:.18e}, lines beginning with # or % are comments.

use anyhow::anyhow;

use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use ndarray::{Array2, ArrayView1};

use crate::align::AlignmentMatrix;

/// reads a dense matrix. All rows must have the same number of values.
pub fn matrix_from_txt(filepath: &Path) -> anyhow::Result<Array2<f64>> {
    let fileres = OpenOptions::new().read(true).open(filepath);
    let file = match fileres {
        Ok(file) => file,
        Err(e) => {
            log::error!("could not open file {:?}", filepath.as_os_str());
            return Err(anyhow!("could not open file {} : {}", filepath.display(), e));
        }
    };
    let bufreader = BufReader::new(file);
    let mut matrix: Option<Array2<f64>> = None;
    for (nb_line, line) in bufreader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('%') {
            continue;
        }
        let mut row = Vec::<f64>::new();
        for field in trimmed.split(|c: char| c.is_whitespace() || c == ',').filter(|f| !f.is_empty()) {
            let value = field
                .parse::<f64>()
                .map_err(|_| anyhow!("could not decode {} at line {} of {}", field, nb_line + 1, filepath.display()))?;
            row.push(value);
        }
        let matrix = matrix.get_or_insert_with(|| Array2::<f64>::zeros((0, row.len())));
        if matrix.ncols() != row.len() {
            log::error!("line {} has {} values, expected {}", nb_line + 1, row.len(), matrix.ncols());
            return Err(anyhow!(
                "non constant number of values at line {}, expected {} got {}",
                nb_line + 1,
                matrix.ncols(),
                row.len()
            ));
        }
        matrix.push_row(ArrayView1::from(row.as_slice()))?;
    }
    let matrix = matrix.ok_or_else(|| anyhow!("no data in {}", filepath.display()))?;
    log::info!("read matrix {:?} from {}", matrix.dim(), filepath.display());
    Ok(matrix)
} // end of matrix_from_txt

/// dumps a dense matrix
pub fn matrix_to_txt(matrix: &Array2<f64>, filepath: &Path) -> anyhow::Result<()> {
    let fileres = OpenOptions::new().write(true).create(true).truncate(true).open(filepath);
    let file = match fileres {
        Ok(file) => file,
        Err(e) => {
            log::error!("could not open file {:?}", filepath.as_os_str());
            return Err(anyhow!("could not open file {} : {}", filepath.display(), e));
        }
    };
    let mut bufwriter = BufWriter::new(file);
    for row in matrix.outer_iter() {
        let line: Vec<String> = row.iter().map(|x| format!("{:.18e}", x)).collect();
        writeln!(bufwriter, "{}", line.join(" "))?;
    }
    bufwriter.flush()?;
    log::info!("dumped matrix {:?} in {}", matrix.dim(), filepath.display());
    Ok(())
} // end of matrix_to_txt

/// dumps an alignment as a dense matrix, entries not stored in a sparse alignment are 0.
pub fn alignment_to_txt(alignment: &AlignmentMatrix, filepath: &Path) -> anyhow::Result<()> {
    matrix_to_txt(&alignment.to_dense(), filepath)
}

//========================================================================================

// end of mod tests
