#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    /// Fetch the enriched list; `refresh` drops the cached copy first.
    LoadList { refresh: bool },
    LoadDetail { id: u32 },
    CancelDetail,
    LoadSprite { url: String },
}
