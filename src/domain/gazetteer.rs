//! Fixed port gazetteer used to backfill missing coordinates.

use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;

/// Latitude/longitude pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

const PORTS: &[(&str, f64, f64)] = &[
    ("Shanghai", 31.2304, 121.4737),
    ("Singapore", 1.3521, 103.8198),
    ("Ningbo-Zhoushan", 29.8683, 121.5440),
    ("Shenzhen", 22.5431, 114.0579),
    ("Guangzhou Harbor", 23.1291, 113.2644),
    ("Busan", 35.1796, 129.0756),
    ("Qingdao", 36.0662, 120.3826),
    ("Hong Kong", 22.3193, 114.1694),
    ("Tianjin", 39.1252, 117.1994),
    ("Rotterdam", 51.9225, 4.4792),
    ("Jebel Ali", 25.0657, 55.1172),
    ("Port Klang", 3.0083, 101.3923),
    ("Xiamen", 24.4798, 118.0894),
    ("Antwerp", 51.2213, 4.4051),
    ("Kaohsiung", 22.6273, 120.3014),
    ("Dalian", 38.9140, 121.6147),
    ("Los Angeles", 34.0522, -118.2437),
    ("Hamburg", 53.5511, 9.9937),
    ("Tanjung Pelepas", 1.3620, 103.5376),
    ("Laem Chabang", 13.0865, 100.8972),
    ("Keihin Ports", 35.6590, 139.7016),
    ("Long Beach", 33.7701, -118.1937),
    ("Tanjung Priok", -6.1176, 106.9083),
    ("New York-New Jersey", 40.7128, -74.0060),
    ("Colombo", 6.9271, 79.8612),
    ("Ho Chi Minh City", 10.7769, 106.7009),
    ("Suzhou", 31.2989, 120.5853),
    ("Piraeus", 37.9475, 23.6371),
    ("Yingkou", 40.6656, 122.2356),
    ("Valencia", 39.4699, -0.3763),
    ("Manila", 14.5995, 120.9842),
    ("Taicang", 31.4500, 121.1000),
    ("Hai Phong", 20.8652, 106.6839),
    ("Algeciras", 36.1408, -5.4562),
    ("Jawaharlal Nehru Port (Nhava Sheva)", 18.9476, 72.9355),
    ("Bremen/Bremerhaven", 53.0793, 8.8017),
    ("Tanger Med", 35.8844, -5.4942),
    ("Lianyungang", 34.6000, 119.1667),
    ("Mundra", 22.8396, 69.7051),
    ("Savannah", 32.0835, -81.0998),
    ("Tokyo", 35.6828, 139.7595),
    ("Rizhao", 35.4000, 119.5500),
    ("Foshan", 23.0215, 113.1214),
    ("Jeddah", 21.4858, 39.1925),
    ("Colon", 9.3598, -79.9000),
    ("Santos", -23.9545, -46.3336),
    ("Salalah", 17.0197, 54.0897),
    ("Dongguan", 23.0207, 113.7518),
    ("Guangxi Beibu", 21.6146, 108.3225),
    ("Cai Mep", 10.5028, 107.0333),
    ("Port Said", 31.2653, 32.3019),
    ("Qinzhou", 21.9500, 108.6167),
    ("NW Seaport Alliance", 47.6062, -122.3321),
    ("Felixstowe", 51.9629, 1.3511),
    ("Marsaxlokk", 35.8410, 14.5438),
    ("Nanjing", 32.0603, 118.7969),
    ("Fuzhou", 26.0745, 119.2966),
    ("Barcelona", 41.3851, 2.1734),
    ("Vancouver", 49.2827, -123.1207),
];

static GAZETTEER: Lazy<HashMap<&'static str, Coordinates>> = Lazy::new(|| {
    PORTS
        .iter()
        .map(|&(name, latitude, longitude)| {
            (
                name,
                Coordinates {
                    latitude,
                    longitude,
                },
            )
        })
        .collect()
});

/// Exact, case-sensitive lookup. Unknown ports are `None`, never an error.
pub fn lookup(port_name: &str) -> Option<Coordinates> {
    GAZETTEER.get(port_name).copied()
}

pub fn len() -> usize {
    GAZETTEER.len()
}
