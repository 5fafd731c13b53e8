//! Write a synthetic WiFi walk (CSV or Parquet) for trying out the engine.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use clap::Parser;
use log::info;
use parquet::arrow::ArrowWriter;

use wifi_archive::data::schema::{
    FieldKind, SchemaVersion, BSSID, CHANNEL_NUMBER, DNS_TIME, FLOOR, LATITUDE, LINK_SPEED,
    LONGITUDE, NEIGHBOR_COUNT, PING_JITTER, PING_LOSS_RATE, PING_MS, RSSI, SSID, TIMESTAMP,
    WIFI_FREQUENCY,
};

#[derive(Parser)]
#[command(name = "generate-sample", about = "Write synthetic WiFi telemetry")]
struct Args {
    /// Output file; `.parquet` writes Parquet, anything else CSV
    #[arg(default_value = "sample_wifi.csv")]
    output: PathBuf,
    /// Layout to emit (v1 or v3)
    #[arg(long, default_value = "v3")]
    schema: SchemaVersion,
    #[arg(long, default_value_t = 2_000)]
    rows: usize,
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[(self.next_u64() % items.len() as u64) as usize]
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// One access point the walker may be associated with.
struct AccessPoint {
    ssid: &'static str,
    bssid: &'static str,
    channel: u32,
    frequency: f64,
    floor: &'static str,
}

static ACCESS_POINTS: [AccessPoint; 4] = [
    AccessPoint {
        ssid: "campus",
        bssid: "a4:2b:b0:10:00:01",
        channel: 6,
        frequency: 2437.0,
        floor: "4F",
    },
    AccessPoint {
        ssid: "campus",
        bssid: "a4:2b:b0:10:00:02",
        channel: 36,
        frequency: 5180.0,
        floor: "4F",
    },
    AccessPoint {
        ssid: "campus-5g",
        bssid: "a4:2b:b0:20:00:01",
        channel: 149,
        frequency: 5745.0,
        floor: "B1",
    },
    AccessPoint {
        ssid: "guest",
        bssid: "70:4f:57:00:00:09",
        channel: 1,
        frequency: 2412.0,
        floor: "5F",
    },
];

/// A generated row, kept as text cells in schema column order.
fn generate_rows(schema: SchemaVersion, rows: usize, rng: &mut SimpleRng) -> Vec<Vec<String>> {
    let start_ms: i64 = 1_735_689_600_000;
    let mut ts = start_ms;
    let mut ap = &ACCESS_POINTS[0];
    let mut out = Vec::with_capacity(rows);

    for _ in 0..rows {
        ts += 1_000 + (rng.next_f64() * 200.0) as i64;
        if rng.chance(0.02) {
            ap = rng.pick(&ACCESS_POINTS);
        }

        let failed = rng.chance(0.05);
        let rssi = rng.gauss(-58.0, 7.0).round().clamp(-95.0, -25.0);
        let ping = if failed { -1.0 } else { rng.gauss(24.0, 8.0).abs().round() };
        let link_speed = ((rssi + 100.0) * 12.0).round().max(6.0);
        let (lat, lon) = if rng.chance(0.15) {
            (0.0, 0.0)
        } else {
            (37.5665 + rng.gauss(0.0, 0.0003), 126.978 + rng.gauss(0.0, 0.0003))
        };

        let mut row = Vec::new();
        for field in schema.fields() {
            let cell = match field.name {
                TIMESTAMP => ts.to_string(),
                RSSI => rssi.to_string(),
                LINK_SPEED => link_speed.to_string(),
                SSID => ap.ssid.to_string(),
                BSSID => ap.bssid.to_string(),
                PING_MS => ping.to_string(),
                LATITUDE => format!("{lat:.6}"),
                LONGITUDE => format!("{lon:.6}"),
                FLOOR => ap.floor.to_string(),
                PING_LOSS_RATE if failed => "100".to_string(),
                PING_LOSS_RATE => format!("{:.1}", rng.gauss(1.0, 2.0).abs()),
                PING_JITTER if failed => "-1".to_string(),
                PING_JITTER => format!("{:.1}", rng.gauss(3.0, 2.0).abs()),
                WIFI_FREQUENCY => ap.frequency.to_string(),
                CHANNEL_NUMBER => ap.channel.to_string(),
                NEIGHBOR_COUNT => (rng.gauss(14.0, 5.0).abs().round() as u32).to_string(),
                DNS_TIME if failed => "-1".to_string(),
                DNS_TIME => rng.gauss(30.0, 10.0).abs().round().to_string(),
                _ => String::new(),
            };
            row.push(cell);
        }
        out.push(row);
    }
    out
}

fn write_csv(path: &Path, schema: SchemaVersion, rows: &[Vec<String>]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV output")?;
    writer.write_record(schema.fields().iter().map(|f| f.name))?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(path: &Path, schema: SchemaVersion, rows: &[Vec<String>]) -> Result<()> {
    let fields = schema.fields();
    let arrow_schema = Arc::new(Schema::new(
        fields
            .iter()
            .map(|f| {
                let dtype = match f.kind {
                    FieldKind::Numeric => DataType::Float64,
                    FieldKind::Categorical => DataType::Utf8,
                };
                Field::new(f.name, dtype, true)
            })
            .collect::<Vec<_>>(),
    ));

    let columns: Vec<ArrayRef> = fields
        .iter()
        .enumerate()
        .map(|(i, f)| -> ArrayRef {
            match f.kind {
                FieldKind::Numeric => Arc::new(Float64Array::from(
                    rows.iter().map(|r| r[i].parse::<f64>().ok()).collect::<Vec<_>>(),
                )),
                FieldKind::Categorical => Arc::new(StringArray::from(
                    rows.iter().map(|r| r[i].as_str()).collect::<Vec<_>>(),
                )),
            }
        })
        .collect();

    let batch =
        RecordBatch::try_new(arrow_schema.clone(), columns).context("building record batch")?;
    let file = std::fs::File::create(path).context("creating parquet output")?;
    let mut writer = ArrowWriter::try_new(file, arrow_schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    if args.schema == SchemaVersion::Untyped {
        anyhow::bail!("pick v1 or v3 for sample data");
    }

    let mut rng = SimpleRng::new(args.seed);
    let rows = generate_rows(args.schema, args.rows, &mut rng);

    let is_parquet = args
        .output
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("parquet"));
    if is_parquet {
        write_parquet(&args.output, args.schema, &rows)?;
    } else {
        write_csv(&args.output, args.schema, &rows)?;
    }

    info!("schema {} with {} columns", args.schema, args.schema.fields().len());
    println!(
        "Wrote {} {} records to {}",
        rows.len(),
        args.schema,
        args.output.display()
    );
    Ok(())
}
