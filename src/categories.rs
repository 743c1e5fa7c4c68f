/// Vehicle dataset categories and their display colors
///
/// The dataset keys are the class names the detector is trained with (including
/// the dataset's own `motorcyle` spelling). Display names are what end users see
/// in labels.
use image::Rgb;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    LicensePlate,
    Car,
    Motorcycle,
    Truck,
}

impl Category {
    /// All categories in dataset (class index) order
    pub const ALL: [Category; 4] = [
        Category::LicensePlate,
        Category::Car,
        Category::Motorcycle,
        Category::Truck,
    ];

    pub fn dataset_key(self) -> &'static str {
        match self {
            Category::LicensePlate => "License_Plate",
            Category::Car => "cars",
            Category::Motorcycle => "motorcyle",
            Category::Truck => "truck",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Category::LicensePlate => "车牌",
            Category::Car => "汽车",
            Category::Motorcycle => "摩托车",
            Category::Truck => "卡车",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.dataset_key() == key)
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn color(self) -> Rgb<u8> {
        category_color(self.index())
    }
}

/// Display names in class index order
pub fn label_list() -> Vec<&'static str> {
    Category::ALL.iter().map(|c| c.display_name()).collect()
}

/// Color for a class index, cycling through the palette
pub fn category_color(index: usize) -> Rgb<u8> {
    const PALETTE: [[u8; 3]; 20] = [
        [255, 56, 56], [255, 157, 151], [255, 112, 31], [255, 178, 29],
        [207, 210, 49], [72, 249, 10], [146, 204, 23], [61, 219, 134],
        [26, 147, 52], [0, 212, 187], [44, 153, 168], [0, 194, 255],
        [52, 69, 147], [100, 115, 255], [0, 24, 236], [132, 56, 255],
        [82, 0, 133], [203, 56, 255], [255, 149, 200], [255, 55, 199],
    ];
    Rgb(PALETTE[index % PALETTE.len()])
}
