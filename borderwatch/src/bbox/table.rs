//! Built-in country bounding boxes.
//!
//! Coarse rectangles for the Americas and Europe. Rectangles overlap along
//! shared borders and around islands, so a point may match several entries.

use super::CountryBBox;

/// Built-in table, in lookup order.
#[rustfmt::skip]
pub(crate) static BUILTIN_BBOXES: &[CountryBBox] = &[
    CountryBBox::from_static("AR", (-55.1, -21.8), (-68.0, -53.6)),
    CountryBBox::from_static("CL", (-56.0, -17.5), (-109.5, -66.5)),
    CountryBBox::from_static("BR", (-33.8, 5.3), (-73.9, -28.8)),
    CountryBBox::from_static("PE", (-18.4, 0.0), (-81.4, -68.7)),
    CountryBBox::from_static("BO", (-22.9, -9.7), (-69.6, -57.5)),
    CountryBBox::from_static("PY", (-27.6, -19.3), (-62.6, -54.3)),
    CountryBBox::from_static("UY", (-35.0, -30.1), (-58.4, -53.1)),
    CountryBBox::from_static("CO", (-4.2, 12.5), (-79.0, -66.9)),
    CountryBBox::from_static("VE", (0.6, 12.2), (-73.4, -59.8)),
    CountryBBox::from_static("EC", (-5.0, 1.7), (-92.0, -75.2)),
    CountryBBox::from_static("GY", (1.2, 8.6), (-61.4, -56.5)),
    CountryBBox::from_static("SR", (1.8, 6.0), (-58.1, -53.9)),
    CountryBBox::from_static("GF", (2.1, 5.8), (-54.6, -51.6)),
    CountryBBox::from_static("US", (24.5, 71.5), (-179.2, -66.9)),
    CountryBBox::from_static("CA", (41.7, 83.1), (-141.0, -52.6)),
    CountryBBox::from_static("MX", (14.5, 32.7), (-118.4, -86.7)),
    CountryBBox::from_static("GT", (13.7, 17.8), (-92.2, -88.2)),
    CountryBBox::from_static("BZ", (15.9, 18.5), (-89.2, -87.5)),
    CountryBBox::from_static("SV", (13.1, 14.4), (-90.1, -87.7)),
    CountryBBox::from_static("HN", (12.9, 16.5), (-89.4, -83.1)),
    CountryBBox::from_static("NI", (10.7, 15.0), (-87.7, -82.7)),
    CountryBBox::from_static("CR", (8.0, 11.2), (-85.9, -82.6)),
    CountryBBox::from_static("PA", (7.2, 9.6), (-83.1, -77.2)),
    CountryBBox::from_static("CU", (19.8, 23.3), (-84.9, -74.1)),
    CountryBBox::from_static("DO", (17.5, 19.9), (-72.0, -68.3)),
    CountryBBox::from_static("HT", (18.0, 20.1), (-74.5, -71.6)),
    CountryBBox::from_static("JM", (17.7, 18.5), (-78.4, -76.2)),
    CountryBBox::from_static("PR", (17.9, 18.5), (-67.3, -65.2)),
    CountryBBox::from_static("ES", (36.0, 43.8), (-18.2, 4.3)),
    CountryBBox::from_static("FR", (41.3, 51.1), (-5.1, 9.6)),
    CountryBBox::from_static("IT", (36.6, 47.1), (6.6, 18.5)),
    CountryBBox::from_static("DE", (47.3, 55.1), (5.9, 15.0)),
    CountryBBox::from_static("GB", (49.9, 60.9), (-8.6, 1.8)),
    CountryBBox::from_static("PT", (36.9, 42.2), (-31.3, -6.2)),
    CountryBBox::from_static("NL", (50.8, 53.6), (3.4, 7.2)),
    CountryBBox::from_static("BE", (49.5, 51.5), (2.5, 6.4)),
    CountryBBox::from_static("CH", (45.8, 47.8), (5.9, 10.5)),
    CountryBBox::from_static("AT", (46.4, 49.0), (9.5, 17.2)),
    CountryBBox::from_static("PL", (49.0, 54.8), (14.1, 24.1)),
    CountryBBox::from_static("SE", (55.3, 69.1), (11.1, 24.2)),
    CountryBBox::from_static("NO", (57.9, 71.2), (4.6, 31.1)),
    CountryBBox::from_static("FI", (59.8, 70.1), (20.5, 31.6)),
    CountryBBox::from_static("DK", (54.6, 57.7), (8.1, 15.2)),
    CountryBBox::from_static("GR", (34.8, 41.7), (19.4, 28.2)),
];
