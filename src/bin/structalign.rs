//! an executable for aligning the nodes of 2 graphs given as a combined graph.
//! example usage:
//! structalign --input combined.txt --boundary 1133 --truth truth.txt --maxlayer 2 --alpha 0.01 --numtop 10
//! structalign --input combined.txt --attributes attr.txt --gammaattr 1. --landmarks 200 --hnsw --output emb
//!
//! Nodes 0..boundary of the combined graph are the nodes of the first graph, nodes boundary..n those of the second graph.
//! The ground truth, if given, gives on each line a node of the first graph and its partner as a rank in the second graph.
//! Outputs are written only when the alignment succeeded.

use anyhow::anyhow;
use clap::{Arg, ArgMatches, Command};

use std::path::Path;
use std::str::FromStr;

use structalign::prelude::*;

// decodes an optional value
fn parse_value<T: FromStr>(matches: &ArgMatches, name: &str) -> Result<Option<T>, anyhow::Error> {
    match matches.value_of(name) {
        Some(str) => match str.parse::<T>() {
            Ok(val) => Ok(Some(val)),
            _ => Err(anyhow!("error parsing {}, got {}", name, str)),
        },
        None => Ok(None),
    }
} // end of parse_value

fn parse_rep_params(matches: &ArgMatches) -> Result<RepParams, anyhow::Error> {
    log::debug!("in parse_rep_params");
    let defaults = RepParams::default();
    //
    let max_layer = match matches.value_of("maxlayer") {
        Some("all") => None,
        Some(str) => match str.parse::<usize>() {
            Ok(val) => Some(val),
            _ => return Err(anyhow!("error parsing maxlayer, expecting an integer or all")),
        },
        None => Some(defaults.get_max_layer()),
    };
    let alpha = parse_value::<f64>(matches, "alpha")?.unwrap_or(defaults.get_alpha());
    let landmarks = match parse_value::<usize>(matches, "landmarks")? {
        Some(k) => LandmarkCount::Fixed(k),
        None => LandmarkCount::LogScaled(parse_value::<usize>(matches, "k")?.unwrap_or(10)),
    };
    let buckets = parse_value::<f64>(matches, "buckets")?.or(defaults.get_buckets());
    let mut params = RepParams::new(max_layer, alpha, landmarks, buckets);
    //
    let gamma_struc = parse_value::<f64>(matches, "gammastruc")?.unwrap_or(defaults.get_gamma_struc());
    let gamma_attr = parse_value::<f64>(matches, "gammaattr")?.unwrap_or(defaults.get_gamma_attr());
    params.set_gammas(gamma_struc, gamma_attr);
    //
    let sampling = match matches.value_of("sampling") {
        Some("uniform") | None => LandmarkSampling::Uniform,
        Some("degree") => LandmarkSampling::DegreeWeighted,
        Some(other) => return Err(anyhow!("sampling must be uniform or degree, got {}", other)),
    };
    let seed = parse_value::<u64>(matches, "seed")?.unwrap_or(defaults.get_seed());
    params.set_sampling(sampling, seed);
    //
    if matches.is_present("nonormalize") {
        params.set_normalize(false);
    }
    if matches.is_present("rownormalize") {
        params.set_row_normalize(true);
    }
    Ok(params)
} // end of parse_rep_params

fn parse_align_params(matches: &ArgMatches) -> Result<AlignParams, anyhow::Error> {
    log::debug!("in parse_align_params");
    let numtop = parse_value::<usize>(matches, "numtop")?.unwrap_or(10);
    let measure = match matches.value_of("measure") {
        Some("exp") | None => SimilarityMeasure::ExpDistance,
        Some("inner") => SimilarityMeasure::InnerProduct,
        Some(other) => return Err(anyhow!("measure must be exp or inner, got {}", other)),
    };
    let search = if matches.is_present("hnsw") {
        NeighbourSearch::default_hnsw()
    } else {
        NeighbourSearch::Exact
    };
    Ok(AlignParams::new(numtop, measure, search))
} // end of parse_align_params

fn run(matches: &ArgMatches) -> Result<(), anyhow::Error> {
    let rep_params = parse_rep_params(matches)?;
    let align_params = parse_align_params(matches)?;
    //
    let attributes = match matches.value_of("attributes") {
        Some(fname) => Some(matrix_from_txt(Path::new(fname))?),
        None => None,
    };
    let nb_nodes = attributes.as_ref().map(|a| a.nrows());
    let input = matches
        .value_of("input")
        .ok_or_else(|| anyhow!("an input file is required"))?;
    log::info!("input file : {:?}", input);
    let graph = graph_from_csv(Path::new(input), nb_nodes, attributes)?;
    //
    let boundary = parse_value::<usize>(matches, "boundary")?.unwrap_or(graph.nb_nodes() / 2);
    if let Some(dimensions) = parse_value::<usize>(matches, "dimensions")? {
        let nb_landmarks = rep_params.get_landmarks().count(graph.nb_nodes());
        if dimensions != nb_landmarks {
            log::info!(
                "dimension asked : {}, embedding dimension is the number of landmarks : {}",
                dimensions,
                nb_landmarks
            );
        }
    }
    let truth = match matches.value_of("truth") {
        Some(fname) => Some(truth_from_csv(Path::new(fname))?),
        None => None,
    };
    //
    let structalign = StructAlign::new(rep_params, align_params);
    let result = structalign
        .run(&graph, boundary)
        .map_err(|e| anyhow!("alignment failed : {}", e))?;
    //
    if let Some(truth) = truth {
        let numtop = align_params.get_numtop();
        let (top1, _) = score_alignment(result.get_matrix(), 1, &truth)?;
        println!("top 1 accuracy : {:.4}", top1);
        if numtop > 1 {
            let (topk, _) = score_alignment(result.get_matrix(), numtop, &truth)?;
            println!("top {} accuracy : {:.4}", numtop, topk);
        }
    }
    //
    if let Some(name) = matches.value_of("output") {
        bson_dump(result.get_embedded(), &Output::new(Some(name)))?;
    }
    let alignment_name = matches.value_of("alignment").unwrap_or("alignment.txt");
    alignment_to_txt(result.get_matrix(), Path::new(alignment_name))?;
    Ok(())
} // end of run

pub fn main() {
    //
    env_logger::Builder::from_default_env().init();
    log::info!("logger initialized");
    //
    let matches = Command::new("structalign")
        .arg_required_else_help(true)
        .arg(Arg::new("input")
            .long("input")
            .takes_value(true)
            .required(true)
            .help("edge list of the combined graph"))
        .arg(Arg::new("boundary")
            .long("boundary")
            .takes_value(true)
            .help("number of nodes of first graph, default half of the nodes"))
        .arg(Arg::new("attributes")
            .long("attributes")
            .takes_value(true)
            .help("text matrix of node attributes, one row by node"))
        .arg(Arg::new("truth")
            .long("truth")
            .takes_value(true)
            .help("ground truth, node of first graph and rank of its partner in second graph"))
        .arg(Arg::new("output")
            .long("output")
            .takes_value(true)
            .help("name of bson dump of the embedding"))
        .arg(Arg::new("alignment")
            .long("alignment")
            .takes_value(true)
            .help("name of the text dump of alignment matrix, default alignment.txt"))
        .arg(Arg::new("maxlayer")
            .long("maxlayer")
            .takes_value(true)
            .help("number of hops explored around a node, \"all\" for no limit, default 2"))
        .arg(Arg::new("alpha")
            .long("alpha")
            .takes_value(true)
            .help("discount factor of distant layers, in ]0., 1.]"))
        .arg(Arg::new("k")
            .long("k")
            .takes_value(true)
            .help("landmarks are k * log2(nb nodes), default 10"))
        .arg(Arg::new("landmarks")
            .long("landmarks")
            .takes_value(true)
            .help("fixed number of landmarks"))
        .arg(Arg::new("dimensions")
            .long("dimensions")
            .takes_value(true)
            .help("embedding dimension asked, informational"))
        .arg(Arg::new("buckets")
            .long("buckets")
            .takes_value(true)
            .help("base of logarithmic degree binning, 1 for exact degrees"))
        .arg(Arg::new("gammastruc")
            .long("gammastruc")
            .takes_value(true)
            .help("weight of structural similarity"))
        .arg(Arg::new("gammaattr")
            .long("gammaattr")
            .takes_value(true)
            .help("weight of attribute similarity"))
        .arg(Arg::new("numtop")
            .long("numtop")
            .takes_value(true)
            .help("number of candidates kept by node, 0 for dense alignment, default 10"))
        .arg(Arg::new("seed")
            .long("seed")
            .takes_value(true)
            .help("seed of landmark sampling"))
        .arg(Arg::new("sampling")
            .long("sampling")
            .takes_value(true)
            .help("landmark sampling : uniform or degree"))
        .arg(Arg::new("measure")
            .long("measure")
            .takes_value(true)
            .help("score of embedded pairs : exp or inner"))
        .arg(Arg::new("hnsw")
            .long("hnsw")
            .help("approximate search of candidates"))
        .arg(Arg::new("nonormalize")
            .long("nonormalize")
            .help("do not normalize degree histograms"))
        .arg(Arg::new("rownormalize")
            .long("rownormalize")
            .help("normalize embedded vectors"))
    .get_matches();
    //
    if let Err(e) = run(&matches) {
        log::error!("structalign failed : {:?}", e);
        println!("structalign failed : {}", e);
        std::process::exit(1);
    }
} // end of main
