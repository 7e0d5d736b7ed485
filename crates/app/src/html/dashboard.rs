pub const DASHBOARD_HTML: &str = r#"
<!doctype html>
<html lang="en" class="h-full dark">

<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Incident Console</title>

  <link rel="preconnect" href="https://fonts.googleapis.com" />
  <link rel="preconnect" href="https://fonts.gstatic.com" crossorigin />
  <link href="https://fonts.googleapis.com/css2?family=Rajdhani:wght@500;600;700&display=swap" rel="stylesheet" />
  <style type="text/tailwindcss">
    @theme {
      --font-tactical: "Rajdhani", ui-sans-serif, system-ui;
      --color-mission-bg: #050B16;
      --color-mission-panel: #0A1628;
      --color-mission-panel-light: #13233D;
      --color-mission-accent: #38bdf8;
      --color-mission-warning: #facc15;
      --color-mission-danger: #fb7185;
      --color-mission-success: #4ade80;
    }

    @layer base {
      html { @apply h-full; }
      body { @apply h-full bg-mission-bg text-slate-100 font-[Rajdhani]; }
      [x-cloak] { display: none !important; }
    }

    @layer components {
      .panel { @apply rounded-lg border border-sky-400/20 bg-mission-panel shadow-lg; }
      .btn { @apply rounded-md border border-sky-400/40 px-3 py-1 text-sm font-semibold uppercase tracking-wide hover:bg-sky-400/20 disabled:opacity-40; }
      .cell { @apply px-3 py-2 align-top whitespace-nowrap; }
    }
  </style>
  <script src="https://cdn.jsdelivr.net/npm/@tailwindcss/browser@4"></script>

  <link rel="stylesheet" href="https://cdnjs.cloudflare.com/ajax/libs/leaflet/1.9.4/leaflet.css" crossorigin="anonymous"
    referrerpolicy="no-referrer" />
  <script src="https://cdnjs.cloudflare.com/ajax/libs/leaflet/1.9.4/leaflet.js" crossorigin="anonymous"
    referrerpolicy="no-referrer"></script>

  <style>
    .leaflet-container { background: #050b16; }
    .leaflet-popup-content-wrapper {
      background: rgba(15, 23, 42, .95);
      color: #f8fafc;
      border-radius: 10px;
      border: 1px solid rgba(56, 189, 248, .35);
    }
    .leaflet-popup-tip { background: rgba(15, 23, 42, .95); }
    .incident-dot {
      width: 16px; height: 16px; border-radius: 50%;
      border: 2px solid rgba(15, 23, 42, .85);
      box-shadow: 0 0 10px rgba(251, 113, 133, .6);
      background: #fb7185;
    }
    .incident-dot.resolved { background: #4ade80; box-shadow: 0 0 10px rgba(74, 222, 128, .6); }
  </style>

  <script defer src="https://cdn.jsdelivr.net/npm/alpinejs@3.13.5/dist/cdn.min.js" crossorigin="anonymous"></script>
</head>

<body x-data="incidentConsole()" x-init="init()" class="h-full">
  <div class="flex h-screen flex-col gap-3 p-3">
    <header class="panel flex flex-wrap items-center gap-4 px-4 py-2">
      <h1 class="text-xl font-bold tracking-widest text-mission-accent">INCIDENT CONSOLE</h1>

      <div class="flex items-center gap-2 text-sm">
        <label for="filter" class="uppercase text-slate-400">Filter</label>
        <select id="filter" x-model="filter" @change="changeFilter()"
          class="rounded-md border border-sky-400/30 bg-mission-panel-light px-2 py-1">
          <option value="all">All</option>
          <option value="unresolved">Unresolved</option>
          <option value="resolved">Resolved</option>
        </select>
        <button class="btn" @click="refresh()">Refresh</button>
        <a class="btn" href="/ledger">Ledger</a>
      </div>

      <div class="ml-auto flex flex-wrap items-center gap-4 text-sm">
        <span :class="verdictClass()" x-text="verdictText()"></span>
        <span class="text-slate-400">
          <span x-text="status.incidents ?? 0"></span> incidents ·
          <span x-text="status.markers ?? 0"></span> on map
        </span>
        <span class="text-slate-400" x-show="status.last_success" x-cloak>
          updated <span x-text="status.last_success"></span>
        </span>
        <span class="font-semibold text-mission-warning" x-show="status.stale" x-cloak>FEED STALE</span>
        <span class="font-semibold text-mission-danger" x-show="status.last_error" x-cloak
          x-text="status.last_error"></span>
        <span class="text-slate-500" x-show="!connected" x-cloak>reconnecting…</span>
      </div>
    </header>

    <div x-show="notice" x-cloak class="panel border-mission-danger/50 px-4 py-2 text-sm text-mission-danger"
      x-text="notice"></div>

    <main class="grid min-h-0 flex-1 grid-cols-1 gap-3 lg:grid-cols-2">
      <section class="panel relative min-h-[320px] overflow-hidden">
        <div id="map" class="absolute inset-0"></div>
      </section>

      <section class="panel min-h-0 overflow-auto">
        <table class="min-w-full text-sm">
          <thead class="sticky top-0 bg-mission-panel-light text-left uppercase text-slate-400">
            <tr>
              <th class="cell">Incident</th>
              <th class="cell">Subject</th>
              <th class="cell">Time</th>
              <th class="cell">Location</th>
              <th class="cell">Status</th>
              <th class="cell">Resolved by</th>
              <th class="cell">Resolved at</th>
              <th class="cell">Message</th>
              <th class="cell"></th>
            </tr>
          </thead>
          <tbody>
            <template x-for="row in orderedRows()" :key="row.handle">
              <tr class="border-t border-sky-400/10 hover:bg-sky-400/5" @click="focusIncident(row.incident_id)">
                <td class="cell font-mono text-xs" x-text="row.incident_id"></td>
                <td class="cell" x-text="row.subject"></td>
                <td class="cell" x-text="row.time"></td>
                <td class="cell font-mono text-xs" x-text="row.location"></td>
                <td class="cell">
                  <span :class="row.status === 'Resolved' ? 'text-mission-success' : 'text-mission-danger'"
                    x-text="row.status"></span>
                </td>
                <td class="cell" x-text="row.resolved_by"></td>
                <td class="cell" x-text="row.resolved_at"></td>
                <td class="cell whitespace-normal" x-text="row.message"></td>
                <td class="cell">
                  <button class="btn" x-show="row.resolvable" :disabled="pending[row.incident_id]"
                    @click.stop="resolve(row.incident_id)">Resolve</button>
                </td>
              </tr>
            </template>
          </tbody>
        </table>
      </section>
    </main>
  </div>

  <script>
    function incidentConsole() {
      return {
        map: null,
        markers: {},
        rows: {},
        status: {},
        verdict: {},
        filter: 'all',
        connected: false,
        notice: '',
        pending: {},
        sequence: 0,
        source: null,

        init() {
          this.initMap();
          this.connect();
        },

        initMap() {
          this.map = L.map('map', {center: [25.57, 91.88], zoom: 7, zoomControl: false, attributionControl: false});
          L.tileLayer('https://{s}.basemaps.cartocdn.com/dark_all/{z}/{x}/{y}{r}.png', {
            maxZoom: 20, subdomains: 'abcd',
            attribution: '&copy; OpenStreetMap contributors &copy; CARTO'
          }).addTo(this.map);
          L.control.zoom({position: 'bottomright'}).addTo(this.map);
          L.control.scale({position: 'bottomleft'}).addTo(this.map);
        },

        connect() {
          if (this.source) this.source.close();
          this.source = new EventSource('/api/stream');
          this.source.onopen = () => { this.connected = true; };
          this.source.onerror = () => { this.connected = false; };
          this.source.addEventListener('snapshot', (event) => this.applySnapshot(JSON.parse(event.data)));
          this.source.addEventListener('pass', (event) => this.applyPass(JSON.parse(event.data)));
        },

        applySnapshot(view) {
          for (const handle of Object.keys(this.markers)) this.dropMarker(handle);
          this.rows = {};
          for (const row of view.overlay.rows) this.rows[row.handle] = row;
          for (const marker of view.overlay.markers) this.placeMarker(marker);
          this.sequence = view.sequence;
          this.applyStatus(view.status, view.verdict);
        },

        applyPass(event) {
          if (event.sequence <= this.sequence) return;
          this.sequence = event.sequence;
          for (const op of event.ops) {
            switch (op.op) {
              case 'row_added':
              case 'row_updated':
                this.rows[op.row.handle] = op.row;
                break;
              case 'row_removed':
                delete this.rows[op.handle];
                break;
              case 'marker_added':
                this.placeMarker(op.marker);
                break;
              case 'marker_moved':
                this.moveMarker(op.marker);
                break;
              case 'marker_removed':
                this.dropMarker(op.handle);
                break;
            }
          }
          this.applyStatus(event.status, event.verdict);
        },

        applyStatus(status, verdict) {
          this.status = status || {};
          this.verdict = verdict || {};
          if (this.status.filter) this.filter = this.status.filter;
        },

        icon(resolved) {
          return L.divIcon({className: '', html: `<div class="incident-dot${resolved ? ' resolved' : ''}"></div>`, iconSize: [16, 16]});
        },

        popup(marker) {
          const root = document.createElement('div');
          for (const [label, value] of marker.popup) {
            const line = document.createElement('div');
            const key = document.createElement('strong');
            key.textContent = `${label}: `;
            line.appendChild(key);
            line.appendChild(document.createTextNode(value));
            root.appendChild(line);
          }
          return root;
        },

        placeMarker(marker) {
          const layer = L.marker([marker.position.lat, marker.position.lon], {icon: this.icon(marker.resolved)})
            .bindPopup(this.popup(marker))
            .addTo(this.map);
          this.markers[marker.handle] = {layer, incident: marker.incident_id};
        },

        moveMarker(marker) {
          const entry = this.markers[marker.handle];
          if (!entry) return this.placeMarker(marker);
          entry.layer.setLatLng([marker.position.lat, marker.position.lon]);
          entry.layer.setIcon(this.icon(marker.resolved));
          entry.layer.setPopupContent(this.popup(marker));
        },

        dropMarker(handle) {
          const entry = this.markers[handle];
          if (!entry) return;
          this.map.removeLayer(entry.layer);
          delete this.markers[handle];
        },

        focusIncident(incidentId) {
          const entry = Object.values(this.markers).find((m) => m.incident === incidentId);
          if (!entry) return;
          this.map.panTo(entry.layer.getLatLng());
          entry.layer.openPopup();
        },

        orderedRows() {
          return Object.values(this.rows).sort((a, b) => a.handle - b.handle);
        },

        verdictText() {
          if (this.verdict.error && !this.verdict.summary) return `Ledger status unavailable: ${this.verdict.error}`;
          return this.verdict.summary || 'Ledger status pending';
        },

        verdictClass() {
          if (!this.verdict.verdict) return 'text-slate-400';
          return this.verdict.verdict.valid ? 'text-mission-success' : 'text-mission-danger font-semibold';
        },

        async post(url) {
          const response = await fetch(url, {method: 'POST'});
          const body = await response.json().catch(() => ({}));
          if (!response.ok) throw new Error(body.error || `HTTP ${response.status}`);
          return body;
        },

        async refresh() {
          try { await this.post('/api/refresh'); this.notice = ''; }
          catch (err) { this.notice = err.message; }
        },

        async changeFilter() {
          try { await this.post(`/api/filter?value=${encodeURIComponent(this.filter)}`); this.notice = ''; }
          catch (err) { this.notice = err.message; }
        },

        async resolve(incidentId) {
          const remembered = localStorage.getItem('resolver') || '';
          const resolver = window.prompt('Resolved by', remembered);
          if (resolver === null) return;
          if (resolver.trim()) localStorage.setItem('resolver', resolver.trim());
          this.pending[incidentId] = true;
          try {
            const query = resolver.trim() ? `?resolved_by=${encodeURIComponent(resolver.trim())}` : '';
            await this.post(`/api/incidents/${encodeURIComponent(incidentId)}/resolve${query}`);
            this.notice = '';
          } catch (err) {
            this.notice = `Could not resolve ${incidentId}: ${err.message}`;
          } finally {
            delete this.pending[incidentId];
          }
        }
      };
    }
  </script>
</body>

</html>
"#;
