use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{BooleanArray, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

const ROWS: usize = 200_000;

const SPECIES: [&str; 6] = ["otter", "badger", "heron", "lynx", "marten", "stoat"];

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
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
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

    fn below(&mut self, n: u64) -> u64 {
        self.next_u64() % n
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let mut rng = SimpleRng::new(42);

    let ids: Vec<i64> = (0..ROWS as i64).collect();
    let ages: Vec<i64> = (0..ROWS).map(|_| rng.below(90) as i64).collect();
    let species: Vec<&str> = (0..ROWS)
        .map(|_| SPECIES[rng.below(SPECIES.len() as u64) as usize])
        .collect();
    // roughly one score in twenty is missing
    let scores: Vec<Option<f64>> = (0..ROWS)
        .map(|_| {
            let v = rng.next_f64();
            (rng.below(20) != 0).then_some(v * 100.0)
        })
        .collect();
    let flagged: Vec<bool> = (0..ROWS).map(|_| rng.below(10) == 0).collect();

    let schema = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("age", DataType::Int64, false),
        Field::new("species", DataType::Utf8, false),
        Field::new("score", DataType::Float64, true),
        Field::new("flagged", DataType::Boolean, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Int64Array::from(ids)),
            Arc::new(Int64Array::from(ages)),
            Arc::new(StringArray::from(species)),
            Arc::new(Float64Array::from(scores)),
            Arc::new(BooleanArray::from(flagged)),
        ],
    )
    .context("building record batch")?;

    // Write Parquet
    let output_path = "sample_table.parquet";
    let file = std::fs::File::create(output_path).context("creating output file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing writer")?;

    log::info!("wrote {ROWS} rows to {output_path}");
    println!("Wrote {ROWS} rows to {output_path}");
    Ok(())
}
