//! ensure serde is working as expected

use super::*;

#[test]
fn test_serde() {
    #[derive(serde::Serialize, serde::Deserialize, Debug, PartialEq, Eq)]
    struct MyTypes {
        f1: Fixed,
        f2: F26Dot6,
        f3: F2Dot14,
        f4: Fix32,
        gid: GlyphId,
        tag: Tag,
        point: Point<Fix32>,
        bbox: BoundingBox<i16>,
    }

    let my_instance = MyTypes {
        f1: Fixed::from_f64(521.5),
        f2: F26Dot6::from_f64(-1001.1),
        f3: F2Dot14::from_f64(1.2),
        f4: Fix32::from_bits(-300),
        gid: GlyphId::new(69),
        tag: Tag::new(b"cool"),
        point: Point::new(Fix32::ONE, Fix32::from_bits(7)),
        bbox: BoundingBox {
            x_min: -441,
            y_min: -432,
            x_max: 2024,
            y_max: 2033,
        },
    };

    let dumped = serde_json::to_string(&my_instance).unwrap();
    let loaded: MyTypes = serde_json::from_str(&dumped).unwrap();
    assert_eq!(my_instance, loaded)
}
