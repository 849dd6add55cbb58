// Entity categories used to filter spatial queries. Each collider carries exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Wall,
    Obstacle,
    Player,
    Enemy,
}

impl Category {
    const fn bit(self) -> u32 {
        match self {
            Self::Wall => 1 << 0,
            Self::Obstacle => 1 << 1,
            Self::Player => 1 << 2,
            Self::Enemy => 1 << 3,
        }
    }
}

// Set of categories a query should consider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryMask(u32);

impl CategoryMask {
    pub const ALL: Self = Self(u32::MAX);
    // Anything that blocks sight and light
    pub const OCCLUDERS: Self = Self::of(Category::Wall).with(Category::Obstacle);

    #[must_use]
    pub const fn of(category: Category) -> Self {
        Self(category.bit())
    }

    #[must_use]
    pub const fn with(self, category: Category) -> Self {
        Self(self.0 | category.bit())
    }

    #[must_use]
    pub const fn contains(self, category: Category) -> bool {
        self.0 & category.bit() != 0
    }
}
