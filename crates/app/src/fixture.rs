//! Fixed quick-setup data set.

use milvus_otel_domain::{CollectionName, Dimension, Record, RecordBatch};
use milvus_otel_shared::{ErrorEnvelope, Result};

/// Collection the harness creates and drops.
pub const QUICK_SETUP_COLLECTION: &str = "quick_setup";

/// Vector dimensionality of the quick-setup collection.
pub const QUICK_SETUP_DIMENSION: u64 = 5;

/// Rows in [`quick_setup_records`].
pub const QUICK_SETUP_RECORD_COUNT: u64 = 10;

// f64 source values; FloatVector fields hold f32.
#[allow(clippy::unreadable_literal)]
const RECORDS: [(i64, [f64; 5], &str); 10] = [
    (
        0,
        [
            0.3580376395471989,
            -0.6023495712049978,
            0.18414012509913835,
            -0.26286205330961354,
            0.9029438446296592,
        ],
        "pink_8682",
    ),
    (
        1,
        [
            0.19886812562848388,
            0.06023560599112088,
            0.6976963061752597,
            0.2614474506242501,
            0.838729485096104,
        ],
        "red_7025",
    ),
    (
        2,
        [
            0.43742130801983836,
            -0.5597502546264526,
            0.6457887650909682,
            0.7894058910881185,
            0.20785793220625592,
        ],
        "orange_6781",
    ),
    (
        3,
        [
            0.3172005263489739,
            0.9719044792798428,
            -0.36981146090600725,
            -0.4860894583077995,
            0.95791889146345,
        ],
        "pink_9298",
    ),
    (
        4,
        [
            0.4452349528804562,
            -0.8757026943054742,
            0.8220779437047674,
            0.46406290649483184,
            0.30337481143159106,
        ],
        "red_4794",
    ),
    (
        5,
        [
            0.985825131989184,
            -0.8144651566660419,
            0.6299267002202009,
            0.1206906911183383,
            -0.1446277761879955,
        ],
        "yellow_4222",
    ),
    (
        6,
        [
            0.8371977790571115,
            -0.015764369584852833,
            -0.31062937026679327,
            -0.562666951622192,
            -0.8984947637863987,
        ],
        "red_9392",
    ),
    (
        7,
        [
            -0.33445148015177995,
            -0.2567135004164067,
            0.8987539745369246,
            0.9402995886420709,
            0.5378064918413052,
        ],
        "grey_8510",
    ),
    (
        8,
        [
            0.39524717779832685,
            0.4000257286739164,
            -0.5890507376891594,
            -0.8650502298996872,
            -0.6140360785406336,
        ],
        "white_9381",
    ),
    (
        9,
        [
            0.5718280481994695,
            0.24070317428066512,
            -0.3737913482606834,
            -0.06726932177492717,
            -0.6980531615588608,
        ],
        "purple_4976",
    ),
];

/// The ten literal records, ids `0..10`.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn quick_setup_records() -> Vec<Record> {
    RECORDS
        .iter()
        .map(|(id, vector, color)| {
            let vector: Vec<f32> = vector.iter().map(|value| *value as f32).collect();
            Record::new(*id, vector, *color)
        })
        .collect()
}

/// `quick_setup` as a validated collection name.
pub fn quick_setup_collection() -> Result<CollectionName> {
    CollectionName::parse(QUICK_SETUP_COLLECTION).map_err(ErrorEnvelope::from)
}

/// The literal records validated against [`QUICK_SETUP_DIMENSION`].
pub fn quick_setup_batch() -> Result<RecordBatch> {
    let dimension = Dimension::new(QUICK_SETUP_DIMENSION).map_err(ErrorEnvelope::from)?;
    RecordBatch::new(dimension, quick_setup_records()).map_err(ErrorEnvelope::from)
}
