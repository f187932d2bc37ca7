pub mod data;
pub mod dates;
pub mod embedded_json;
pub mod normalize;
pub mod sample;
pub mod surface;
