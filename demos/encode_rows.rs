use std::{env::args_os, io};

use eaip_airspace::{
    Airspace, AirspaceRow, BorderPolyline, BoundaryEncoder, BoundaryGrammar, Config,
};
use serde::Serialize;
use tracing::error;

#[derive(Serialize)]
struct EncodedAirspace {
    airspace: Airspace,
    gml: String,
}

fn main() {
    tracing_subscriber::fmt().with_writer(io::stderr).init();
    let rows_path = args_os()
        .nth(1)
        .expect("missing argument: path to rows.json");
    let border = args_os()
        .nth(2)
        .filter(|path| !path.is_empty())
        .map(|path| BorderPolyline::from_path(path).expect("unsuccessful border parse"));
    let config = args_os()
        .nth(3)
        .map(|path| Config::from_path(path).expect("unsuccessful config parse"))
        .unwrap_or_default();

    let rows: Vec<AirspaceRow> =
        serde_json::from_slice(&fs_err::read(rows_path).unwrap()).expect("unsuccessful rows parse");
    let grammar = BoundaryGrammar::new(&config).expect("invalid config");
    let encoder = BoundaryEncoder::new(&config);

    let encoded = rows
        .iter()
        .filter_map(|row| match Airspace::from_row(row, &grammar, border.as_ref()) {
            Ok(airspace) => match encoder.to_gml(&airspace.boundary) {
                Ok(gml) => Some(EncodedAirspace { airspace, gml }),
                Err(e) => {
                    error!("{}: {e}", row.designator);
                    None
                }
            },
            Err(e) => {
                error!("{e}");
                None
            }
        })
        .collect::<Vec<_>>();

    println!("{}", serde_json::to_string_pretty(&encoded).unwrap());
}
