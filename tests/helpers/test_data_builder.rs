// ==========================================
// 测试数据构建器 - 用于集成测试
// ==========================================

use chrono::{DateTime, Duration, Utc};
use oee_analytics::domain::types::MachineStatus;
use oee_analytics::domain::{Machine, MachineDowntime, ProductionRun};

// ==========================================
// Machine 构建器
// ==========================================

pub struct MachineBuilder {
    machine_id: String,
    machine_name: Option<String>,
    target_speed: f64,
    status: MachineStatus,
}

impl MachineBuilder {
    pub fn new(machine_id: &str) -> Self {
        Self {
            machine_id: machine_id.to_string(),
            machine_name: None,
            target_speed: 60.0,
            status: MachineStatus::Running,
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.machine_name = Some(name.to_string());
        self
    }

    pub fn target_speed(mut self, speed: f64) -> Self {
        self.target_speed = speed;
        self
    }

    pub fn status(mut self, status: MachineStatus) -> Self {
        self.status = status;
        self
    }

    pub fn build(self) -> Machine {
        let name = self
            .machine_name
            .unwrap_or_else(|| format!("{} 号机", self.machine_id));
        Machine::new(self.machine_id, name, self.target_speed, self.status)
    }
}

// ==========================================
// ProductionRun 构建器
// ==========================================

pub struct RunBuilder {
    machine_id: String,
    product_id: String,
    start_time: DateTime<Utc>,
    duration_minutes: Option<i64>,
    produced: i64,
    good: i64,
}

impl RunBuilder {
    pub fn new(machine_id: &str, product_id: &str, start_time: DateTime<Utc>) -> Self {
        Self {
            machine_id: machine_id.to_string(),
            product_id: product_id.to_string(),
            start_time,
            duration_minutes: None,
            produced: 0,
            good: 0,
        }
    }

    /// 产量与良品数（不良数 = 产量 - 良品）
    pub fn units(mut self, produced: i64, good: i64) -> Self {
        self.produced = produced;
        self.good = good;
        self
    }

    pub fn lasting(mut self, minutes: i64) -> Self {
        self.duration_minutes = Some(minutes);
        self
    }

    pub fn build(self) -> ProductionRun {
        let mut run = ProductionRun::new(
            self.machine_id,
            self.product_id,
            self.start_time,
            self.produced,
            self.good,
            self.produced - self.good,
        );
        run.end_time = self
            .duration_minutes
            .map(|m| self.start_time + Duration::minutes(m));
        run
    }
}

/// 已结束的停机记录
pub fn downtime(
    machine_id: &str,
    start: DateTime<Utc>,
    minutes: i64,
    category: &str,
) -> MachineDowntime {
    MachineDowntime::new(
        machine_id,
        start,
        Some(start + Duration::minutes(minutes)),
        category,
    )
}

/// 未结束的停机记录
pub fn open_downtime(machine_id: &str, start: DateTime<Utc>, category: &str) -> MachineDowntime {
    MachineDowntime::new(machine_id, start, None, category)
}
