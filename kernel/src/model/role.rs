use strum::{AsRefStr, Display, EnumString};

// 認可の区分は外部から与えられる admin / user の二値のみ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, AsRefStr, Display, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum Role {
    Admin,
    #[default]
    User,
}
