/// Reference coordinates for a postcode
#[derive(Debug, Clone, PartialEq)]
pub struct GeoCoordinate {
    pub postcode: u32,
    pub latitude: f64,
    pub longitude: f64,
    pub city: String,
    pub state: String,
    pub pos_id: String,
}
