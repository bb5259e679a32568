/// 答题卡模板枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum SheetTemplate {
    /// 标准 20 题
    #[serde(rename = "standard_20")]
    Standard20,
    /// 扩展 50 题
    #[serde(rename = "extended_50")]
    Extended50,
    /// 综合 100 题
    #[serde(rename = "comprehensive_100")]
    Comprehensive100,
}

impl SheetTemplate {
    /// 全部已知模板
    pub const ALL: [SheetTemplate; 3] = [
        SheetTemplate::Standard20,
        SheetTemplate::Extended50,
        SheetTemplate::Comprehensive100,
    ];

    /// 识别服务使用的模板标识
    pub fn id(self) -> &'static str {
        match self {
            SheetTemplate::Standard20 => "standard_20",
            SheetTemplate::Extended50 => "extended_50",
            SheetTemplate::Comprehensive100 => "comprehensive_100",
        }
    }

    /// 题目数量
    pub fn question_count(self) -> u32 {
        match self {
            SheetTemplate::Standard20 => 20,
            SheetTemplate::Extended50 => 50,
            SheetTemplate::Comprehensive100 => 100,
        }
    }

    /// 显示名称
    pub fn display_name(self) -> &'static str {
        match self {
            SheetTemplate::Standard20 => "标准 20 题答题卡",
            SheetTemplate::Extended50 => "扩展 50 题答题卡",
            SheetTemplate::Comprehensive100 => "综合 100 题答题卡",
        }
    }

    /// 从模板标识解析（精确匹配，忽略首尾空白）
    pub fn from_id(id: &str) -> Option<Self> {
        match id.trim() {
            "standard_20" => Some(SheetTemplate::Standard20),
            "extended_50" => Some(SheetTemplate::Extended50),
            "comprehensive_100" => Some(SheetTemplate::Comprehensive100),
            _ => None,
        }
    }
}

impl Default for SheetTemplate {
    fn default() -> Self {
        SheetTemplate::Standard20
    }
}

impl std::fmt::Display for SheetTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.display_name(), self.id())
    }
}
