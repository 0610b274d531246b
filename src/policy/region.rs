use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The 25 autonomous districts (자치구) of Seoul.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum Region {
    Jongno,
    Jung,
    Yongsan,
    Seongdong,
    Gwangjin,
    Dongdaemun,
    Jungnang,
    Seongbuk,
    Gangbuk,
    Dobong,
    Nowon,
    Eunpyeong,
    Seodaemun,
    Mapo,
    Yangcheon,
    Gangseo,
    Guro,
    Geumcheon,
    Yeongdeungpo,
    Dongjak,
    Gwanak,
    Seocho,
    Gangnam,
    Songpa,
    Gangdong,
}

impl Region {
    pub const ALL: [Region; 25] = [
        Region::Jongno,
        Region::Jung,
        Region::Yongsan,
        Region::Seongdong,
        Region::Gwangjin,
        Region::Dongdaemun,
        Region::Jungnang,
        Region::Seongbuk,
        Region::Gangbuk,
        Region::Dobong,
        Region::Nowon,
        Region::Eunpyeong,
        Region::Seodaemun,
        Region::Mapo,
        Region::Yangcheon,
        Region::Gangseo,
        Region::Guro,
        Region::Geumcheon,
        Region::Yeongdeungpo,
        Region::Dongjak,
        Region::Gwanak,
        Region::Seocho,
        Region::Gangnam,
        Region::Songpa,
        Region::Gangdong,
    ];

    pub fn as_slug(&self) -> &'static str {
        match self {
            Self::Jongno => "jongno",
            Self::Jung => "jung",
            Self::Yongsan => "yongsan",
            Self::Seongdong => "seongdong",
            Self::Gwangjin => "gwangjin",
            Self::Dongdaemun => "dongdaemun",
            Self::Jungnang => "jungnang",
            Self::Seongbuk => "seongbuk",
            Self::Gangbuk => "gangbuk",
            Self::Dobong => "dobong",
            Self::Nowon => "nowon",
            Self::Eunpyeong => "eunpyeong",
            Self::Seodaemun => "seodaemun",
            Self::Mapo => "mapo",
            Self::Yangcheon => "yangcheon",
            Self::Gangseo => "gangseo",
            Self::Guro => "guro",
            Self::Geumcheon => "geumcheon",
            Self::Yeongdeungpo => "yeongdeungpo",
            Self::Dongjak => "dongjak",
            Self::Gwanak => "gwanak",
            Self::Seocho => "seocho",
            Self::Gangnam => "gangnam",
            Self::Songpa => "songpa",
            Self::Gangdong => "gangdong",
        }
    }

    pub fn korean_name(&self) -> &'static str {
        match self {
            Self::Jongno => "종로구",
            Self::Jung => "중구",
            Self::Yongsan => "용산구",
            Self::Seongdong => "성동구",
            Self::Gwangjin => "광진구",
            Self::Dongdaemun => "동대문구",
            Self::Jungnang => "중랑구",
            Self::Seongbuk => "성북구",
            Self::Gangbuk => "강북구",
            Self::Dobong => "도봉구",
            Self::Nowon => "노원구",
            Self::Eunpyeong => "은평구",
            Self::Seodaemun => "서대문구",
            Self::Mapo => "마포구",
            Self::Yangcheon => "양천구",
            Self::Gangseo => "강서구",
            Self::Guro => "구로구",
            Self::Geumcheon => "금천구",
            Self::Yeongdeungpo => "영등포구",
            Self::Dongjak => "동작구",
            Self::Gwanak => "관악구",
            Self::Seocho => "서초구",
            Self::Gangnam => "강남구",
            Self::Songpa => "송파구",
            Self::Gangdong => "강동구",
        }
    }
}

impl Display for Region {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.korean_name())
    }
}

#[derive(Debug, Error)]
#[error("unknown Seoul district: {0}")]
pub struct RegionParseError(pub String);

impl FromStr for Region {
    type Err = RegionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some(region) = Region::ALL.iter().find(|r| r.korean_name() == trimmed) {
            return Ok(*region);
        }
        let normalized = trimmed.to_ascii_lowercase().replace('_', "-");
        let normalized = normalized
            .strip_suffix("-gu")
            .or_else(|| normalized.strip_suffix("gu").filter(|rest| rest.len() > 2))
            .unwrap_or(&normalized);
        Region::ALL
            .iter()
            .find(|r| r.as_slug() == normalized)
            .copied()
            .ok_or_else(|| RegionParseError(s.to_string()))
    }
}
